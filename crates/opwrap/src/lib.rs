//! Read 1Password items through the `op` command-line tool
//!
//! This crate wraps the 1Password CLI (`op`) and exposes items as
//! read-only values:
//!
//! - **Client**: checks that `op` is installed, keeps the session token,
//!   signs in when needed and retries a failed lookup once after signing in
//!   again
//! - **Selector**: turns exactly one of title, id or URL into `op item get`
//!   arguments
//! - **Item**: a JSON record whose top-level keys and labeled fields are
//!   readable by name, with ISO-8601 strings read as timestamps
//!
//! # Example
//!
//! ```rust,ignore
//! use opwrap::{Client, ClientSettings, Criteria};
//!
//! let mut client = Client::new(ClientSettings::new("my-team", "Private"))?;
//! let item = client.get(&Criteria::title("Database"))?;
//!
//! let password = item.property("password")?;
//! println!("{}", password.to_text());
//! ```
//!
//! # Session environment
//!
//! Session tokens are passed to `op` as `OP_SESSION_<shorthand>`, where the
//! shorthand is the account up to its first dot. A successful sign-in also
//! exports that variable into the current process.

mod client;
mod error;
mod item;
mod naming;
mod selector;
mod session;
mod settings;
mod shell;
mod value;

pub use client::Client;
pub use error::{OpError, Result};
pub use item::{Item, Record};
pub use naming::{snake_case, RESERVED_NAMES};
pub use selector::{Criteria, Selector, PRIVATE_LINK_MARKER, SHARE_URL_PREFIX};
pub use session::{Session, WhoAmI, SESSION_VAR_PREFIX};
pub use settings::ClientSettings;
pub use shell::{CommandError, CommandLine, CommandOutput, CommandRunner, ShellRunner};
pub use value::{looks_like_timestamp, ItemValue};

//! AppStream Core
//!
//! 宣言ファイル（KDL）のモデルとパーサー。
//!
//! ```kdl
//! project "desktops"
//!
//! provider "aws" { region "eu-west-1" }
//!
//! stack "analysts" { storage-connector "HOMEFOLDERS" }
//!
//! fleet "analysts" {
//!     instance-type "stream.standard.medium"
//!     image-arn "arn:aws:appstream:eu-west-1::image/Base"
//!     stack "analysts"
//!     state "RUNNING"
//! }
//! ```

pub mod error;
pub mod loader;
pub mod model;
pub mod parser;

pub use error::{ProjectError, Result};
pub use loader::load_project;
pub use model::*;
pub use parser::{parse_kdl_file, parse_kdl_string};

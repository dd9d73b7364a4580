//! Kindle - declarative host activation for secrets and shells.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── activate      # Run the activation pipeline
//! │   ├── init          # Generate the host identity
//! │   ├── whoami        # Print host label and public key
//! │   ├── seal          # Seal a field into a bundle
//! │   ├── reseal        # Re-seal bundles for the current policy
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── activation    # links -> tools -> secrets -> shell
//!     ├── bundle/       # Sealed secret bundles and their store
//!     ├── cipher/       # age encryption
//!     ├── config        # kindle.toml management
//!     ├── domain/       # Identity, recipients, bindings
//!     ├── materialize   # Bundle fields -> 0600 runtime files
//!     ├── policy        # Path-pattern recipient rules and drift
//!     ├── shell/        # Per-dialect snippets and entrypoint blocks
//!     ├── links         # Managed symlinks
//!     └── tools         # Fallback tool installs
//! ```
//!
//! # Guarantees
//!
//! - Plaintext only ever lands in 0600 files under the runtime directory
//! - Every generated file is replaced atomically
//! - Re-running activation with unchanged inputs changes nothing on disk

pub mod cli;
pub mod core;
pub mod error;

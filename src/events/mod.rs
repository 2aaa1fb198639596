//! # Events Module
//!
//! Event-driven progress reporting for any front-end.
//!
//! ## Design
//! The engine emits events through channels, so a CLI, GUI or web layer can
//! subscribe and render progress without the core knowing about it. Logging
//! still goes through `tracing`; events carry the structured progress.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Hash(HashEvent::Progress(p)) = event {
//!             println!("Hashed {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! engine.run_with_events(&candidates, &sender, &CancellationToken::new())?;
//! ```

mod channel;
mod types;

pub use channel::{EventChannel, EventReceiver, EventSender};
pub use types::*;

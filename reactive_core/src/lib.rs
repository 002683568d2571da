//! A fine-grained reactive dependency-tracking core.
//!
//! ## Fine-Grained Reactivity
//!
//! Data lives in plain key-value [objects](RawObject). Wrapping an object in
//! a [`reactive`] view makes reads through it *tracked*: when an
//! [effect](create_effect) reads a key, the effect is subscribed to that
//! `(object, key)` pair, and whenever the key is written through a view, the
//! subscribed effects rerun. Dependencies are re-collected on every run, so
//! an effect only ever reruns for the keys its latest run actually read.
//!
//! [`readonly`] and [`shallow_readonly`] produce views that reject writes,
//! for handing data out without handing out the ability to mutate it.
//!
//! ```
//! use reactive_core::*;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let profile = reactive(&object! {
//!     "name": "Alice",
//!     "age": 33,
//! });
//!
//! let greeting = Rc::new(RefCell::new(String::new()));
//!
//! create_effect({
//!     let profile = profile.clone();
//!     let greeting = greeting.clone();
//!     move || {
//!         let name = profile
//!             .get("name")
//!             .and_then(|name| name.as_str().map(String::from))
//!             .unwrap_or_default();
//!         *greeting.borrow_mut() = format!("Hello, {name}!");
//!     }
//! });
//! assert_eq!(*greeting.borrow(), "Hello, Alice!");
//!
//! // writing the tracked key reruns the effect
//! profile.set("name", "Bob").unwrap();
//! assert_eq!(*greeting.borrow(), "Hello, Bob!");
//!
//! // writes to keys the effect never read do not
//! profile.set("age", 34).unwrap();
//! assert_eq!(*greeting.borrow(), "Hello, Bob!");
//! ```
//!
//! ## Ownership
//!
//! Everything here is single-threaded and reference-counted. A dependency
//! holds strong handles to its subscribed effects, so an effect stays alive
//! (and keeps rerunning) for as long as it is subscribed anywhere, even if
//! every user-held handle to it has been dropped. Call [`stop`] to sever an
//! effect's subscriptions; a stopped effect never reruns automatically.

mod dep;
mod effect;
mod handlers;
mod macros;
mod object;
mod proxy;
mod runtime;

pub use dep::*;
pub use effect::*;
pub use object::*;
pub use proxy::*;

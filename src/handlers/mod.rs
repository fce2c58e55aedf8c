//! Built-in downstream handlers.

pub mod greeting;

pub use greeting::GreetingHandler;

//! Protocol state machine: session state, event dispatch and the callback
//! registry handlers are attached to.

pub mod action;
pub mod event;
pub mod handler;
pub mod state;

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod controller;
mod index;
mod store;


pub use self::{
    controller::Controller,
    index::{Index, SharedIndex, Work},
    store::{KubeStore, FIELD_MANAGER},
};

//! Hardware independent half of the garage door opener firmware: page
//! rendering, HTTP parsing, Basic auth, SNTP packets and calendar math.
#![cfg_attr(not(test), no_std)]

pub mod auth;
pub mod civil;
pub mod http;
pub mod pages;
pub mod sntp;

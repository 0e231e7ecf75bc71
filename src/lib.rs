//! Kumiki core library.
//!
//! Kumiki compiles a list of typed build requests (print a file, copy a file,
//! define a file list, run a tool once, run a tool over a file set) into CMake
//! custom-command and custom-target rules. The pipeline is
//! [`manifest`] → [`ast`] → [`ir`] → [`cmake_gen`], with [`config`] carrying
//! the read-only variable bindings through every stage.

pub mod ast;
pub mod cli;
pub mod cmake_gen;
pub mod config;
pub mod ir;
pub mod manifest;
pub mod runner;
pub mod template;

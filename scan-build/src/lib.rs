// SPDX-License-Identifier: GPL-3.0-or-later

pub mod args;
pub mod classify;
pub mod compilation;
pub mod config;
pub mod context;
pub mod environment;
pub mod invocation;
pub mod language;
pub mod modes;
pub mod pipeline;
pub mod report;
pub mod toolchain;

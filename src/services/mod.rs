// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod cache;
pub mod documents;
pub mod hooks;
pub mod logging;
pub mod mapper;
pub mod orchestrator;
pub mod search;
pub mod sync;

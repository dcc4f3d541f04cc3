// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

pub mod config;
pub mod document;
pub mod health;
pub mod schema;
pub mod search;
pub mod version;

// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod admin;
pub mod health;
pub mod history;
pub mod manual;
pub mod static_files;
pub mod webhook;

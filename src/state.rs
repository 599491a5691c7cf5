// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use crate::auth::OperatorCredential;
use crate::backend::Backend;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<Backend>,
    /// Operator token digest; operator routes are refused while `None`.
    pub operator: Option<OperatorCredential>,
}

impl AppState {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend: Arc::new(backend),
            operator: None,
        }
    }

    pub fn with_operator(mut self, credential: OperatorCredential) -> Self {
        self.operator = Some(credential);
        self
    }
}

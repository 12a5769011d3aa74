use super::{StoreState, TaskStorage};
use crate::error::AppError;

/// Volatile storage; contents live as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    state: StoreState,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStorage for MemoryStorage {
    fn load(&self) -> Result<StoreState, AppError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &StoreState) -> Result<(), AppError> {
        self.state = state.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

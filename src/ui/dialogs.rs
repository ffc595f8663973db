use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

/// 阻塞式提示与确认框
pub trait Dialogs: Send + Sync {
    fn notify(&self, message: &str);
    fn confirm(&self, message: &str) -> bool;
}

/// 记录所有提示，按预设值回答确认框
pub struct ScriptedDialogs {
    notices: Mutex<Vec<String>>,
    confirmations: Mutex<Vec<String>>,
    answer: AtomicBool,
}

impl ScriptedDialogs {
    pub fn new(answer: bool) -> Self {
        Self {
            notices: Mutex::new(Vec::new()),
            confirmations: Mutex::new(Vec::new()),
            answer: AtomicBool::new(answer),
        }
    }

    pub fn answer_with(&self, answer: bool) {
        self.answer.store(answer, Ordering::SeqCst);
    }

    pub fn notices(&self) -> Vec<String> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn confirmations(&self) -> Vec<String> {
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Dialogs for ScriptedDialogs {
    fn notify(&self, message: &str) {
        tracing::info!("Notice: {}", message);
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
    }

    fn confirm(&self, message: &str) -> bool {
        let answer = self.answer.load(Ordering::SeqCst);
        tracing::info!("Confirm: {} -> {}", message, answer);
        self.confirmations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.to_string());
        answer
    }
}

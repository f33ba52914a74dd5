//! Secondary task stack: LIFO follow-up work noted during registration and attendance

/// Free-form follow-up tasks, most recent on top
#[derive(Debug, Clone, Default)]
pub struct TaskStack {
    tasks: Vec<String>,
}

impl TaskStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: impl Into<String>) {
        self.tasks.push(task.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.tasks.pop()
    }

    pub fn peek(&self) -> Option<&str> {
        self.tasks.last().map(String::as_str)
    }

    /// Pop until empty, returning tasks in pop order
    pub fn drain(&mut self) -> Vec<String> {
        let mut drained = Vec::with_capacity(self.tasks.len());
        while let Some(task) = self.tasks.pop() {
            drained.push(task);
        }
        drained
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Pending tasks, top of the stack first
    pub fn pending(&self) -> Vec<String> {
        self.tasks.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_drain() {
        let mut stack = TaskStack::new();
        stack.push("generate report for Cerrado");
        stack.push("update status of occurrence 3");
        assert_eq!(stack.peek(), Some("update status of occurrence 3"));

        let drained = stack.drain();
        assert_eq!(
            drained,
            vec!["update status of occurrence 3", "generate report for Cerrado"]
        );
        assert!(stack.is_empty());
        assert!(stack.drain().is_empty());
    }
}

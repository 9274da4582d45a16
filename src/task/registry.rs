//! Task name resolution

use super::{DataItem, Split, Task, TaskType, Tokenizer};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::rc::Rc;

/// Task name selecting a plain causal-LM task
pub const CASUAL_TASK: &str = "casual";

/// Separator joining member names of a composite task
pub const MULTI_TASK_SEPARATOR: char = ';';

/// Data source of a causal-LM task
#[derive(Debug, Clone, PartialEq)]
pub struct CasualTaskSpec {
    pub data: String,
    pub prompt: Option<String>,
    pub val_set_size: Option<usize>,
}

/// Parsed `task_name` configuration
#[derive(Debug, Clone, PartialEq)]
pub enum TaskSpec {
    /// Causal LM over a data file
    Casual(CasualTaskSpec),
    /// Several registered tasks trained as one (`"arc-c;piqa"`)
    Composite(Vec<String>),
    /// A single registered task
    Named(String),
}

impl TaskSpec {
    /// Interpret a task name together with the causal-LM data keys
    pub fn from_parts(
        task_name: &str,
        data: Option<&str>,
        prompt: Option<&str>,
        val_set_size: Option<usize>,
    ) -> Result<Self> {
        if task_name == CASUAL_TASK {
            let data = data.ok_or_else(|| {
                Error::ConfigError("casual task requires a `data` path".to_string())
            })?;
            return Ok(Self::Casual(CasualTaskSpec {
                data: data.to_string(),
                prompt: prompt.map(String::from),
                val_set_size,
            }));
        }
        if task_name.contains(MULTI_TASK_SEPARATOR) {
            let names = task_name
                .split(MULTI_TASK_SEPARATOR)
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(String::from)
                .collect();
            return Ok(Self::Composite(names));
        }
        Ok(Self::Named(task_name.to_string()))
    }

    /// Whether the task combines several registered tasks
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }
}

type CasualFactory = Box<dyn Fn(&CasualTaskSpec) -> Result<Rc<dyn Task>>>;

/// Registry of known tasks
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Rc<dyn Task>>,
    casual: Option<CasualFactory>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under its own name
    pub fn register(&mut self, task: Rc<dyn Task>) -> &mut Self {
        self.tasks.insert(task.name().to_string(), task);
        self
    }

    /// Install the constructor for `casual` tasks
    pub fn with_casual_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&CasualTaskSpec) -> Result<Rc<dyn Task>> + 'static,
    {
        self.casual = Some(Box::new(factory));
        self
    }

    /// Look up a registered task by name
    pub fn get(&self, name: &str) -> Result<Rc<dyn Task>> {
        self.tasks.get(name).cloned().ok_or_else(|| Error::UnknownTask(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Resolve a parsed task spec into a task handle
    pub fn resolve(&self, spec: &TaskSpec) -> Result<Rc<dyn Task>> {
        match spec {
            TaskSpec::Casual(casual) => match &self.casual {
                Some(factory) => factory(casual),
                None => Err(Error::UnknownTask(CASUAL_TASK.to_string())),
            },
            TaskSpec::Composite(names) => {
                let tasks = names.iter().map(|name| self.get(name)).collect::<Result<Vec<_>>>()?;
                Ok(Rc::new(MultiTask::new(names.join(";"), tasks)?))
            }
            TaskSpec::Named(name) => self.get(name),
        }
    }
}

/// Several tasks trained under one adapter
///
/// Data is the concatenation of the members' data. Type, PEFT type and labels
/// come from the first member.
pub struct MultiTask {
    name: String,
    tasks: Vec<Rc<dyn Task>>,
}

impl MultiTask {
    pub fn new(name: impl Into<String>, tasks: Vec<Rc<dyn Task>>) -> Result<Self> {
        let name = name.into();
        if tasks.is_empty() {
            return Err(Error::ConfigError(format!("composite task `{name}` has no members")));
        }
        Ok(Self { name, tasks })
    }

    pub fn members(&self) -> &[Rc<dyn Task>] {
        &self.tasks
    }

    fn primary(&self) -> &Rc<dyn Task> {
        // Non-empty by construction
        &self.tasks[0]
    }
}

impl Task for MultiTask {
    fn name(&self) -> &str {
        &self.name
    }

    fn task_type(&self) -> TaskType {
        self.primary().task_type()
    }

    fn peft_task_type(&self) -> &str {
        self.primary().peft_task_type()
    }

    fn label_list(&self) -> Vec<String> {
        self.primary().label_list()
    }

    fn load_data(&self, tokenizer: &dyn Tokenizer, split: Split) -> Result<Vec<DataItem>> {
        let mut data = Vec::new();
        for task in &self.tasks {
            data.extend(task.load_data(tokenizer, split)?);
        }
        Ok(data)
    }
}

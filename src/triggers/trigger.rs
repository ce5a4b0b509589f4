//! Trigger declarations and evaluation

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::record::{attrs_to_transport, normalize_json, Attrs, Record};

use super::queue::Job;

/// Predicate over the `(before, after)` pair of a mutation
pub type RecordPredicate = Arc<dyn Fn(Option<&Record>, Option<&Record>) -> bool + Send + Sync>;

/// Computes job arguments from `(before, after)`; `None` vetoes the dispatch
pub type ArgsProducer = Arc<dyn Fn(Option<&Record>, Option<&Record>) -> Option<Attrs> + Send + Sync>;

/// How a trigger produces its job arguments
#[derive(Clone)]
pub enum JobArgs {
    /// No arguments
    Empty,
    /// The same arguments on every dispatch
    Static(Attrs),
    /// Arguments computed from the mutation
    Computed(ArgsProducer),
}

impl fmt::Debug for JobArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobArgs::Empty => write!(f, "Empty"),
            JobArgs::Static(args) => f.debug_tuple("Static").field(args).finish(),
            JobArgs::Computed(_) => write!(f, "Computed(<fn>)"),
        }
    }
}

/// A declarative post-mutation rule: dispatch at most one job to `action`
/// per mutation.
#[derive(Clone)]
pub struct Trigger {
    action: String,
    args: JobArgs,
    predicate: Option<RecordPredicate>,
    options: Map<String, Value>,
}

impl Trigger {
    /// Always-fire trigger with no arguments
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            args: JobArgs::Empty,
            predicate: None,
            options: Map::new(),
        }
    }

    /// Static arguments, passed verbatim
    pub fn with_args(mut self, args: Attrs) -> Self {
        self.args = JobArgs::Static(args);
        self
    }

    /// Arguments computed from `(before, after)`
    pub fn with_computed_args<F>(mut self, producer: F) -> Self
    where
        F: Fn(Option<&Record>, Option<&Record>) -> Option<Attrs> + Send + Sync + 'static,
    {
        self.args = JobArgs::Computed(Arc::new(producer));
        self
    }

    /// Only fire when the predicate holds
    pub fn when<F>(mut self, predicate: F) -> Self
    where
        F: Fn(Option<&Record>, Option<&Record>) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    /// Opaque dispatch option passed through to the job queue
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn args_kind(&self) -> &JobArgs {
        &self.args
    }

    /// Whether evaluating this trigger needs the pre-mutation record.
    ///
    /// Always-fire triggers with static (or no) arguments never look at the
    /// records, so they cost no extra read.
    pub fn needs_snapshot(&self) -> bool {
        self.predicate.is_some() || matches!(self.args, JobArgs::Computed(_))
    }

    pub fn should_run(&self, before: Option<&Record>, after: Option<&Record>) -> bool {
        self.predicate.as_ref().map_or(true, |p| p(before, after))
    }

    /// Raw arguments, or `None` if the producer vetoed the dispatch
    pub fn args(&self, before: Option<&Record>, after: Option<&Record>) -> Option<Attrs> {
        match &self.args {
            JobArgs::Empty => Some(Attrs::new()),
            JobArgs::Static(args) => Some(args.clone()),
            JobArgs::Computed(producer) => producer(before, after),
        }
    }

    /// The job to dispatch for this mutation, if any
    pub fn evaluate(&self, before: Option<&Record>, after: Option<&Record>) -> Option<Job> {
        if !self.should_run(before, after) {
            return None;
        }

        let args = self.args(before, after)?;

        Some(Job {
            action: self.action.clone(),
            args: attrs_to_transport(&args),
            options: self
                .options
                .iter()
                .map(|(k, v)| (k.clone(), normalize_json(v)))
                .collect(),
        })
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trigger")
            .field("action", &self.action)
            .field("args", &self.args)
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .field("options", &self.options)
            .finish()
    }
}

/// Whether any trigger needs a before/after diff
pub fn needs_snapshot(triggers: &[Trigger]) -> bool {
    triggers.iter().any(Trigger::needs_snapshot)
}

/// Jobs to dispatch for a mutation, in declaration order
pub fn evaluate(triggers: &[Trigger], before: Option<&Record>, after: Option<&Record>) -> Vec<Job> {
    triggers
        .iter()
        .filter_map(|t| t.evaluate(before, after))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValue;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn status_changed() -> Trigger {
        Trigger::new("notify_status").when(|before, after| {
            before.and_then(|r| r.get("status")) != after.and_then(|r| r.get("status"))
        })
    }

    #[test]
    fn test_needs_snapshot() {
        assert!(!needs_snapshot(&[]));

        let mut args = Attrs::new();
        args.insert("kind".to_string(), "welcome".into());
        assert!(!needs_snapshot(&[Trigger::new("send").with_args(args)]));

        assert!(needs_snapshot(&[Trigger::new("a"), status_changed()]));
        assert!(needs_snapshot(&[Trigger::new("b").with_computed_args(|_, _| None)]));
    }

    #[test]
    fn test_predicate_gates_dispatch() {
        let before = Record::new().with("status", "draft");
        let same = Record::new().with("status", "draft");
        let changed = Record::new().with("status", "live");

        let trigger = status_changed();
        assert!(trigger.evaluate(Some(&before), Some(&same)).is_none());

        let job = trigger.evaluate(Some(&before), Some(&changed)).unwrap();
        assert_eq!(job.action, "notify_status");
        assert!(job.args.is_empty());
    }

    #[test]
    fn test_computed_args_can_veto() {
        let trigger = Trigger::new("index").with_computed_args(|_, after| {
            let after = after?;
            let mut args = Attrs::new();
            args.insert("id".to_string(), after.get("id")?.clone());
            Some(args)
        });

        assert!(trigger.evaluate(Some(&Record::new()), None).is_none());

        let job = trigger.evaluate(None, Some(&Record::new().with("id", 5))).unwrap();
        assert_eq!(Value::Object(job.args), json!({"id": 5}));
    }

    #[test]
    fn test_args_are_normalized() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let trigger = Trigger::new("audit")
            .with_computed_args(move |_, _| {
                let mut args = Attrs::new();
                args.insert("at".to_string(), FieldValue::Timestamp(at));
                args.insert("price".to_string(), FieldValue::Decimal("9.50".into()));
                args.insert("author".to_string(), FieldValue::NotLoaded);
                Some(args)
            })
            .with_option("queue", json!("mailers"));

        let job = trigger.evaluate(None, None).unwrap();

        assert_eq!(
            Value::Object(job.args),
            json!({"at": "2024-01-02T03:04:05Z", "price": "9.50"})
        );
        assert_eq!(job.options.get("queue"), Some(&json!("mailers")));
    }

    #[test]
    fn test_evaluate_keeps_declaration_order() {
        let triggers = vec![Trigger::new("first"), status_changed(), Trigger::new("last")];
        let jobs = evaluate(&triggers, None, Some(&Record::new().with("status", "x")));

        let actions: Vec<&str> = jobs.iter().map(|j| j.action.as_str()).collect();
        assert_eq!(actions, vec!["first", "notify_status", "last"]);
    }
}

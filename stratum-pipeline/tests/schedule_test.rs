//! End-to-end schedule behavior: stage ordering, marker jumps, failure
//! propagation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stratum_pipeline::ir::Module;
use stratum_pipeline::{
    CompilerContext, CompilerError, FailPass, MarkerPass, NoOpPass, Pass, PassContext, PassError,
    PipelineRegistry, Settings,
};

type VisitLog = Arc<Mutex<Vec<String>>>;

/// Records its own invocation, then optionally asserts a marker.
struct RecordPass {
    label: String,
    log: VisitLog,
    marker: Option<String>,
}

impl RecordPass {
    fn new(label: &str, log: &VisitLog) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            marker: None,
        }
    }

    fn with_marker(label: &str, log: &VisitLog, marker: &str) -> Self {
        Self {
            label: label.to_string(),
            log: log.clone(),
            marker: Some(marker.to_string()),
        }
    }
}

impl Pass for RecordPass {
    fn name(&self) -> &str {
        &self.label
    }

    fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
        self.log.lock().unwrap().push(self.label.clone());
        if let Some(marker) = &self.marker {
            module.markers.set(marker.clone());
        }
        Ok(())
    }
}

fn visits(log: &VisitLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[test]
fn linear_pipeline_visits_stages_in_order_once() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(RecordPass::new("a", &log)) as _])
        .register_stage("B", Vec::<String>::new(), vec![Box::new(RecordPass::new("b", &log)) as _])
        .register_stage("C", Vec::<String>::new(), vec![Box::new(RecordPass::new("c", &log)) as _]);

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    assert_eq!(visits(&log), ["a", "b", "c"]);
}

#[test]
fn marker_jump_skips_intermediate_stage_and_clears_marker() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage(
            "A",
            ["C"],
            vec![Box::new(RecordPass::with_marker("a", &log, "C")) as _],
        )
        .register_stage("B", Vec::<String>::new(), vec![Box::new(RecordPass::new("b", &log)) as _])
        .register_stage("C", Vec::<String>::new(), vec![Box::new(RecordPass::new("c", &log)) as _]);

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    assert_eq!(visits(&log), ["a", "c"]);
    assert!(module.markers.is_empty());
}

#[test]
fn no_matching_marker_falls_through_to_default() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage(
            "A",
            ["C"],
            // Marker that matches no declared jump edge of A.
            vec![Box::new(RecordPass::with_marker("a", &log, "unrelated")) as _],
        )
        .register_stage("B", Vec::<String>::new(), vec![Box::new(RecordPass::new("b", &log)) as _])
        .register_stage("C", Vec::<String>::new(), vec![Box::new(RecordPass::new("c", &log)) as _]);

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    assert_eq!(visits(&log), ["a", "b", "c"]);
    // The unmatched marker is left alone for later stages (none declare it).
    assert!(module.markers.test("unrelated"));
}

#[test]
fn declaration_order_breaks_marker_ties_and_clears_only_winner() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();

    struct TwoMarkers {
        log: VisitLog,
    }
    impl Pass for TwoMarkers {
        fn name(&self) -> &str {
            "two-markers"
        }
        fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
            self.log.lock().unwrap().push("a".into());
            // Set in the opposite order of A's jump declaration.
            module.markers.set("y");
            module.markers.set("x");
            Ok(())
        }
    }

    registry
        .register_stage("A", ["x", "y"], vec![Box::new(TwoMarkers { log: log.clone() }) as _])
        .register_stage("x", Vec::<String>::new(), vec![Box::new(RecordPass::new("x", &log)) as _])
        .register_stage("y", Vec::<String>::new(), vec![Box::new(RecordPass::new("y", &log)) as _]);

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    // "x" was declared first, so it wins even though "y" was set first,
    // and the jump lands on stage "x" which then falls through to "y".
    assert_eq!(visits(&log), ["a", "x", "y"]);
    // Only the matched marker was cleared.
    assert!(!module.markers.test("x"));
    assert!(module.markers.test("y"));
}

#[test]
fn stage_failure_stops_pipeline_and_raises_fatal_report() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(RecordPass::new("a", &log)) as _])
        .register_stage(
            "B",
            Vec::<String>::new(),
            vec![Box::new(FailPass::new("tile-legalize", "unsupported tile rank")) as _],
        )
        .register_stage("C", Vec::<String>::new(), vec![Box::new(RecordPass::new("c", &log)) as _]);

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("payload");
    let CompilerError::PipelineFailed { report } = context.run(&mut module).unwrap_err();

    // C never ran.
    assert_eq!(visits(&log), ["a"]);
    // One consolidated report: diagnostic text plus the module dump.
    assert!(report.contains("error: unsupported tile rank"));
    assert!(report.contains("module @payload"));
    assert!(report.contains("stage 'B'"));
}

#[test]
fn failure_in_first_pass_skips_rest_of_stage() {
    let counter = Arc::new(AtomicUsize::new(0));

    struct Counting {
        counter: Arc<AtomicUsize>,
    }
    impl Pass for Counting {
        fn name(&self) -> &str {
            "counting"
        }
        fn run(&self, _module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
            self.counter.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    let mut registry = PipelineRegistry::new();
    registry.register_stage(
        "A",
        Vec::<String>::new(),
        vec![
            Box::new(FailPass::new("boom", "first pass fails")) as _,
            Box::new(Counting {
                counter: counter.clone(),
            }) as _,
        ],
    );

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    assert!(context.run(&mut module).is_err());
    assert_eq!(counter.load(Ordering::Relaxed), 0);
}

#[test]
fn marker_cycle_reenters_until_marker_stops() {
    // B re-asserts the jump marker its first two runs, so control bounces
    // A -> B -> A -> B -> A -> B before falling off the end.
    struct MarkerFirstN {
        log: VisitLog,
        remaining: AtomicUsize,
        marker: &'static str,
    }
    impl Pass for MarkerFirstN {
        fn name(&self) -> &str {
            "marker-first-n"
        }
        fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
            self.log.lock().unwrap().push("b".into());
            if self
                .remaining
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
                .is_ok()
            {
                module.markers.set(self.marker);
            }
            Ok(())
        }
    }

    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(RecordPass::new("a", &log)) as _])
        .register_stage(
            "B",
            ["A"],
            vec![Box::new(MarkerFirstN {
                log: log.clone(),
                remaining: AtomicUsize::new(2),
                marker: "A",
            }) as _],
        );

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    assert_eq!(visits(&log), ["a", "b", "a", "b", "a", "b"]);
    assert!(module.markers.is_empty());
}

#[test]
fn removing_marker_pass_makes_cycle_fall_through() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(RecordPass::new("a", &log)) as _])
        .register_stage("B", ["A"], vec![Box::new(RecordPass::new("b", &log)) as _]);

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    // Nothing asserts the jump marker, so the back edge never fires.
    assert_eq!(visits(&log), ["a", "b"]);
}

#[test]
fn dangling_jump_target_fails_before_any_run() {
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(NoOpPass::new("n")) as _])
        .register_stage("B", ["Z"], vec![]);

    assert!(CompilerContext::new(registry, Settings::default()).is_err());
}

#[test]
fn pass_diagnostics_do_not_leak_across_contexts() {
    // Two contexts with their own engines: a failure in one must not
    // surface in the other's report.
    let mut failing = PipelineRegistry::new();
    failing.register_stage(
        "A",
        Vec::<String>::new(),
        vec![Box::new(FailPass::new("boom", "context one failure")) as _],
    );
    let context_one = CompilerContext::new(failing, Settings::default()).unwrap();

    let mut ok = PipelineRegistry::new();
    ok.register_stage("A", Vec::<String>::new(), vec![Box::new(NoOpPass::new("n")) as _]);
    let context_two = CompilerContext::new(ok, Settings::default()).unwrap();

    let mut module_one = Module::new("one");
    let mut module_two = Module::new("two");
    assert!(context_one.run(&mut module_one).is_err());
    context_two.run(&mut module_two).unwrap();

    // And the failing context still produces its own report on re-run.
    let CompilerError::PipelineFailed { report } = context_one.run(&mut module_one).unwrap_err();
    assert!(report.contains("context one failure"));
}

#[test]
fn verification_failure_is_a_stage_failure() {
    struct BreakModule;
    impl Pass for BreakModule {
        fn name(&self) -> &str {
            "break-module"
        }
        fn run(&self, module: &mut Module, _ctx: &PassContext<'_>) -> Result<(), PassError> {
            module.body.push(stratum_pipeline::ir::Op::new("no_namespace"));
            Ok(())
        }
    }

    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(BreakModule) as _])
        .register_stage("B", Vec::<String>::new(), vec![Box::new(RecordPass::new("b", &log)) as _]);

    let mut settings = Settings::default();
    settings.verify = true;
    let context = CompilerContext::new(registry, settings).unwrap();
    let mut module = Module::new("m");
    let CompilerError::PipelineFailed { report } = context.run(&mut module).unwrap_err();

    assert!(visits(&log).is_empty());
    assert!(report.contains("verification failed after pass 'break-module'"));

    // Without verification the same pipeline runs to completion.
    let mut registry = PipelineRegistry::new();
    registry
        .register_stage("A", Vec::<String>::new(), vec![Box::new(BreakModule) as _])
        .register_stage("B", Vec::<String>::new(), vec![Box::new(RecordPass::new("b", &log)) as _]);
    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();
    assert_eq!(visits(&log), ["b"]);
}

#[test]
fn marker_pass_once_terminates_self_loop() {
    let log: VisitLog = Arc::default();
    let mut registry = PipelineRegistry::new();
    registry.register_stage(
        "A",
        ["A"],
        vec![
            Box::new(RecordPass::new("a", &log)) as _,
            Box::new(MarkerPass::once("detour", "A")) as _,
        ],
    );

    let context = CompilerContext::new(registry, Settings::default()).unwrap();
    let mut module = Module::new("m");
    context.run(&mut module).unwrap();

    assert_eq!(visits(&log), ["a", "a"]);
}

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use classync::app::buffer::BufferPhase;
use classync::app::commit::{CommitOutcome, RefreshPolicy, SelectorCapture};
use classync::app::notify::{NoticeKind, NotificationCenter};
use classync::app::ports::{CodeService, Services, UsageReporter};
use classync::app::selection::SelectionFeed;
use classync::app::session::{ClassEditor, EditorConfig};
use classync::domain::errors::{BufferError, CommitError, SyncError};
use classync::domain::model::{BufferTarget, CodeDiff, MutationRequest, Selector, TemplateNode};
use classync::infra::memory::{ApplyBehavior, CountingLiveView, MemoryDocument, MemoryLiveViews};

const INSTANCE: BufferTarget = BufferTarget::Instance;
const ROOT: BufferTarget = BufferTarget::Root;

#[derive(Default)]
struct RecordingUsage(Mutex<Vec<String>>);

impl UsageReporter for RecordingUsage {
    fn report_usage_event(&self, name: &str) {
        self.0.lock().push(name.to_owned());
    }
}

/// Delays diff building so a commit stays in flight across a suspension point.
struct SlowCode {
    inner: Arc<MemoryDocument>,
    delay: Duration,
}

#[async_trait]
impl CodeService for SlowCode {
    async fn build_code_diffs(&self, requests: &[MutationRequest]) -> Result<Vec<CodeDiff>> {
        tokio::time::sleep(self.delay).await;
        self.inner.build_code_diffs(requests).await
    }

    async fn apply_code_diffs(&self, diffs: &[CodeDiff]) -> Result<bool> {
        self.inner.apply_code_diffs(diffs).await
    }
}

struct Harness {
    document: Arc<MemoryDocument>,
    views: Arc<MemoryLiveViews>,
    preview: Arc<CountingLiveView>,
    usage: Arc<RecordingUsage>,
    notices: Arc<NotificationCenter>,
    feed: SelectionFeed,
    editor: ClassEditor,
}

fn document() -> MemoryDocument {
    let document = MemoryDocument::new();
    document.insert_node("hero", TemplateNode::new("src/Hero.tsx", 4, 8), &["flex", "p-4"]);
    document.insert_node(
        "page",
        TemplateNode::new("src/Page.tsx", 1, 1).with_component("Page"),
        &["min-h-screen", "bg-white"],
    );
    document.insert_node("title", TemplateNode::new("src/Page.tsx", 7, 5), &["text-xl"]);
    document.insert_element("div#hero", Some("hero"), None);
    document.insert_element("h1.title", Some("title"), Some("page"));
    document.insert_element("div#ghost", None, None);
    document
}

fn config() -> EditorConfig {
    EditorConfig {
        refresh: RefreshPolicy::AwaitAll,
        ..EditorConfig::default()
    }
}

impl Harness {
    fn new(config: EditorConfig) -> Self {
        Self::with_code(config, |document| document as Arc<dyn CodeService>)
    }

    fn with_code(
        config: EditorConfig,
        code: impl FnOnce(Arc<MemoryDocument>) -> Arc<dyn CodeService>,
    ) -> Self {
        let document = Arc::new(document());
        let views = Arc::new(MemoryLiveViews::new());
        let preview = views.open("preview");
        let usage = Arc::new(RecordingUsage::default());
        let notices = Arc::new(NotificationCenter::new());
        let feed = SelectionFeed::new();

        let services = Services {
            resolver: document.clone(),
            classes: document.clone(),
            code: code(document.clone()),
            views: views.clone(),
            usage: usage.clone(),
            notifier: notices.clone(),
        };
        let editor = ClassEditor::new(services, feed.tracker(), config);

        Self {
            document,
            views,
            preview,
            usage,
            notices,
            feed,
            editor,
        }
    }

    async fn select(&self, selector: &str) {
        self.feed.select([selector]);
        assert!(self.editor.sync_selection().await);
    }

    fn text(&self, target: BufferTarget) -> String {
        self.editor.view(target).text
    }

    fn edit(&self, target: BufferTarget, text: &str) {
        self.editor.focus(target).expect("focus");
        self.editor.input(target, text).expect("input");
    }

    fn usage_events(&self) -> Vec<String> {
        self.usage.0.lock().clone()
    }

    fn notice_kinds(&self) -> Vec<NoticeKind> {
        self.notices
            .active()
            .into_iter()
            .map(|active| active.notice.kind)
            .collect()
    }
}

fn applied(outcome: Result<CommitOutcome, CommitError>) -> MutationRequest {
    match outcome {
        Ok(CommitOutcome::Applied(report)) => report.request,
        other => panic!("expected an applied commit, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn selected_instance_shows_joined_classes() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;

    let instance = harness.editor.view(INSTANCE);
    assert_eq!(instance.text, "flex p-4");
    assert_eq!(instance.node, harness.document.node("hero"));
    assert_eq!(instance.phase, BufferPhase::Idle);

    let root = harness.editor.view(ROOT);
    assert!(root.node.is_none());
    assert_eq!(root.text, "");
}

#[tokio::test(start_paused = true)]
async fn commit_refreshes_views_and_reconciles_after_settle_delay() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-8 text-red-500");

    let before = harness.document.calls();
    let request = applied(harness.editor.blur(INSTANCE).await);

    assert_eq!(request.attributes.class_name, "flex p-8 text-red-500");
    assert!(request.override_classes);
    assert_eq!(request.selector, Selector::new("div#hero"));
    assert!(request.inserted_elements.is_empty());
    assert!(request.moved_elements.is_empty());
    assert!(request.removed_elements.is_empty());
    assert_eq!(harness.preview.refreshes(), 1);
    assert_eq!(harness.usage_events(), ["tailwind action"]);

    let committed = harness.document.calls();
    assert_eq!(committed.resolve, before.resolve);
    assert_eq!(committed.fetch, before.fetch);

    harness.editor.wait_for_reconciliation().await;
    let reconciled = harness.document.calls();
    assert_eq!(reconciled.resolve, committed.resolve + 2);
    assert_eq!(reconciled.fetch, committed.fetch + 1);
    assert_eq!(harness.text(INSTANCE), "flex p-8 text-red-500");
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn blur_without_instance_node_calls_no_services() {
    let harness = Harness::new(config());
    harness.select("div#ghost").await;
    harness.edit(INSTANCE, "flex");

    let before = harness.document.calls();
    let outcome = harness.editor.blur(INSTANCE).await;
    assert!(matches!(outcome, Ok(CommitOutcome::NoTarget)));

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.document.calls(), before);
    assert_eq!(harness.preview.refreshes(), 0);
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn instance_and_root_commit_independently() {
    let harness = Harness::new(config());
    harness.select("h1.title").await;
    assert_eq!(harness.text(INSTANCE), "text-xl");
    assert_eq!(harness.text(ROOT), "min-h-screen bg-white");

    harness.edit(ROOT, "min-h-screen bg-black");
    harness.edit(INSTANCE, "text-2xl font-bold");

    let root = applied(harness.editor.blur(ROOT).await);
    assert_eq!(root.template_node, harness.document.node("page").unwrap());
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Editing);
    assert_eq!(harness.text(INSTANCE), "text-2xl font-bold");

    let instance = applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(instance.template_node, harness.document.node("title").unwrap());

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(
        harness.document.classes("page"),
        Some(vec!["min-h-screen".to_string(), "bg-black".to_string()])
    );
    assert_eq!(harness.text(ROOT), "min-h-screen bg-black");
    assert_eq!(harness.text(INSTANCE), "text-2xl font-bold");
    assert_eq!(harness.preview.refreshes(), 2);
}

#[tokio::test(start_paused = true)]
async fn concurrent_commits_on_both_buffers_do_not_interfere() {
    let harness = Harness::with_code(config(), |document| {
        Arc::new(SlowCode {
            inner: document,
            delay: Duration::from_millis(50),
        }) as Arc<dyn CodeService>
    });
    harness.select("h1.title").await;
    harness.edit(ROOT, "grid");
    harness.edit(INSTANCE, "italic");

    let (root, instance) = tokio::join!(harness.editor.blur(ROOT), harness.editor.blur(INSTANCE));
    assert_eq!(applied(root).attributes.class_name, "grid");
    assert_eq!(applied(instance).attributes.class_name, "italic");

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.text(ROOT), "grid");
    assert_eq!(harness.text(INSTANCE), "italic");
}

#[tokio::test(start_paused = true)]
async fn rejected_apply_skips_refresh_usage_and_reconciliation() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.document.set_apply_behavior(ApplyBehavior::Reject);
    harness.edit(INSTANCE, "grid gap-4");

    let before = harness.document.calls();
    let outcome = harness.editor.blur(INSTANCE).await;
    assert!(matches!(
        outcome,
        Err(CommitError::Service(SyncError::Rejected))
    ));

    harness.editor.wait_for_reconciliation().await;
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(harness.preview.refreshes(), 0);
    assert!(harness.usage_events().is_empty());
    assert_eq!(harness.document.calls().resolve, before.resolve);
    assert_eq!(harness.text(INSTANCE), "grid gap-4");
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Idle);
    assert_eq!(harness.notice_kinds(), [NoticeKind::MutationServiceFailure]);
}

#[tokio::test(start_paused = true)]
async fn apply_error_is_reported_as_service_failure() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.document.set_apply_behavior(ApplyBehavior::Fail);
    harness.edit(INSTANCE, "grid");

    let outcome = harness.editor.blur(INSTANCE).await;
    assert!(matches!(
        outcome,
        Err(CommitError::Service(SyncError::ApplyFailure { .. }))
    ));
    assert_eq!(harness.views.total_refreshes(), 0);
    assert_eq!(harness.notice_kinds(), [NoticeKind::MutationServiceFailure]);

    let notices = harness.notices.active();
    assert!(harness.notices.dismiss(notices[0].id));
    assert!(harness.notices.active().is_empty());

    // Failures never block further edits.
    harness.document.set_apply_behavior(ApplyBehavior::Accept);
    harness.edit(INSTANCE, "grid gap-2");
    applied(harness.editor.blur(INSTANCE).await);
}

#[tokio::test(start_paused = true)]
async fn empty_selection_at_settle_skips_reconciliation() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-2");
    applied(harness.editor.blur(INSTANCE).await);

    harness.feed.clear();
    let before = harness.document.calls();
    harness.editor.wait_for_reconciliation().await;

    assert_eq!(harness.document.calls().resolve, before.resolve);
    assert_eq!(harness.document.calls().fetch, before.fetch);
    assert_eq!(harness.notice_kinds(), [NoticeKind::StaleSelection]);
    assert_eq!(harness.text(INSTANCE), "flex p-2");
}

#[tokio::test(start_paused = true)]
async fn repeated_commit_of_same_string_is_idempotent() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;

    harness.edit(INSTANCE, "flex p-8");
    let first = applied(harness.editor.blur(INSTANCE).await);
    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.text(INSTANCE), "flex p-8");

    tokio::time::sleep(Duration::from_millis(10)).await;
    harness.edit(INSTANCE, "flex p-8");
    let second = applied(harness.editor.blur(INSTANCE).await);
    harness.editor.wait_for_reconciliation().await;

    assert!(first.same_edit(&second));
    assert_eq!(harness.text(INSTANCE), "flex p-8");
    assert_eq!(
        harness.document.classes("hero"),
        Some(vec!["flex".to_string(), "p-8".to_string()])
    );
}

#[tokio::test(start_paused = true)]
async fn at_commit_capture_uses_selection_at_blur() {
    let harness = Harness::new(EditorConfig {
        selector_capture: SelectorCapture::AtCommit,
        ..config()
    });
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-6");
    harness.feed.select(["h1.title"]);

    let request = applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(request.selector, Selector::new("h1.title"));
    assert_eq!(request.template_node, harness.document.node("hero").unwrap());

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.text(INSTANCE), "text-xl");
    assert_eq!(harness.text(ROOT), "min-h-screen bg-white");
}

#[tokio::test(start_paused = true)]
async fn at_focus_capture_uses_selection_when_editing_began() {
    let harness = Harness::new(EditorConfig {
        selector_capture: SelectorCapture::AtFocus,
        ..config()
    });
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-6");
    harness.feed.select(["h1.title"]);

    let request = applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(request.selector, Selector::new("div#hero"));
    assert_eq!(request.template_node, harness.document.node("hero").unwrap());
}

async fn resync_mid_edit_abandons_old_edit(capture: SelectorCapture) {
    let harness = Harness::new(EditorConfig {
        selector_capture: capture,
        ..config()
    });
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "grid gap-9");

    harness.select("h1.title").await;
    let view = harness.editor.view(INSTANCE);
    assert_eq!(view.node, harness.document.node("title"));
    assert_eq!(view.text, "text-xl");
    assert_eq!(view.phase, BufferPhase::Idle);

    let before = harness.document.calls();
    let outcome = harness.editor.blur(INSTANCE).await;
    assert!(matches!(outcome, Ok(CommitOutcome::NotEditing)));
    assert_eq!(harness.document.calls(), before);
    assert_eq!(harness.document.classes("title"), Some(vec!["text-xl".to_string()]));
    assert_eq!(
        harness.document.classes("hero"),
        Some(vec!["flex".to_string(), "p-4".to_string()])
    );

    harness.edit(INSTANCE, "text-2xl");
    let request = applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(request.template_node, harness.document.node("title").unwrap());
    assert_eq!(request.selector, Selector::new("h1.title"));
    assert_eq!(
        harness.document.classes("hero"),
        Some(vec!["flex".to_string(), "p-4".to_string()])
    );
}

#[tokio::test(start_paused = true)]
async fn resync_mid_edit_at_commit_capture() {
    resync_mid_edit_abandons_old_edit(SelectorCapture::AtCommit).await;
}

#[tokio::test(start_paused = true)]
async fn resync_mid_edit_at_focus_capture() {
    resync_mid_edit_abandons_old_edit(SelectorCapture::AtFocus).await;
}

#[tokio::test(start_paused = true)]
async fn reconciling_same_element_keeps_typed_text() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-12");
    harness.document.set_classes("hero", &["flex", "p-5"]);

    harness.select("div#hero").await;
    assert_eq!(harness.text(INSTANCE), "flex p-12");
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Editing);

    let request = applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(request.template_node, harness.document.node("hero").unwrap());
    assert_eq!(request.attributes.class_name, "flex p-12");
}

#[tokio::test(start_paused = true)]
async fn element_removed_before_blur_still_commits_to_resolved_node() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-10");
    harness.document.remove_element("div#hero");

    let request = applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(request.template_node, harness.document.node("hero").unwrap());
    assert_eq!(
        harness.document.classes("hero"),
        Some(vec!["flex".to_string(), "p-10".to_string()])
    );

    let before = harness.document.calls();
    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.document.calls().resolve, before.resolve + 2);
    assert_eq!(harness.document.calls().fetch, before.fetch);
    let view = harness.editor.view(INSTANCE);
    assert!(view.node.is_none());
    assert_eq!(view.text, "flex p-10");
}

#[tokio::test(start_paused = true)]
async fn commit_without_any_selection_is_reported() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex");
    harness.feed.clear();

    let before = harness.document.calls();
    let outcome = harness.editor.blur(INSTANCE).await;
    assert!(matches!(outcome, Err(CommitError::NoSelection)));
    assert_eq!(harness.document.calls(), before);
    assert_eq!(harness.notice_kinds(), [NoticeKind::NoSelection]);
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn buffer_rejects_refocus_and_blur_while_committing() {
    let harness = Harness::with_code(config(), |document| {
        Arc::new(SlowCode {
            inner: document,
            delay: Duration::from_millis(200),
        }) as Arc<dyn CodeService>
    });
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-1");

    let racing = async {
        tokio::task::yield_now().await;
        let phase = harness.editor.view(INSTANCE).phase;
        let focus = harness.editor.focus(INSTANCE);
        let blur = harness.editor.blur(INSTANCE).await;
        (phase, focus, blur)
    };
    let (first, (phase, focus, blur)) = tokio::join!(harness.editor.blur(INSTANCE), racing);

    assert_eq!(phase, BufferPhase::Committing);
    assert_eq!(focus, Err(BufferError::Busy(INSTANCE)));
    assert!(matches!(
        blur,
        Err(CommitError::Buffer(BufferError::Busy(BufferTarget::Instance)))
    ));
    assert_eq!(applied(first).attributes.class_name, "flex p-1");
    assert_eq!(harness.document.calls().apply, 1);
}

#[tokio::test(start_paused = true)]
async fn selection_change_does_not_abort_commit_in_flight() {
    let harness = Harness::with_code(config(), |document| {
        Arc::new(SlowCode {
            inner: document,
            delay: Duration::from_millis(100),
        }) as Arc<dyn CodeService>
    });
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "grid");

    let switch = async {
        tokio::task::yield_now().await;
        harness.select("h1.title").await;
    };
    let (outcome, ()) = tokio::join!(harness.editor.blur(INSTANCE), switch);

    let request = applied(outcome);
    assert_eq!(request.selector, Selector::new("div#hero"));
    assert_eq!(
        harness.document.classes("hero"),
        Some(vec!["grid".to_string()])
    );

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.text(INSTANCE), "text-xl");
    assert_eq!(harness.editor.view(INSTANCE).node, harness.document.node("title"));
}

#[tokio::test(start_paused = true)]
async fn load_failure_keeps_buffer_and_notifies() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;

    harness.document.set_fetch_failure(true);
    harness.document.set_classes("hero", &["hidden"]);
    harness.select("div#hero").await;

    assert_eq!(harness.text(INSTANCE), "flex p-4");
    let notices = harness.notices.active();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].notice.kind, NoticeKind::LoadFailure);
    assert_eq!(notices[0].notice.target, Some(INSTANCE));
}

#[tokio::test(start_paused = true)]
async fn external_mutation_is_picked_up_on_reconciliation() {
    let harness = Harness::new(config());
    harness.select("h1.title").await;
    harness.edit(INSTANCE, "text-3xl");
    applied(harness.editor.blur(INSTANCE).await);

    harness.document.set_classes("page", &["min-h-screen", "bg-slate-900"]);
    harness.editor.wait_for_reconciliation().await;

    assert_eq!(harness.text(ROOT), "min-h-screen bg-slate-900");
    assert_eq!(harness.text(INSTANCE), "text-3xl");
}

#[tokio::test(start_paused = true)]
async fn commit_keys_blur_and_other_keys_do_not() {
    let harness = Harness::new(config());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex p-3");

    assert!(harness.editor.key(INSTANCE, "a").await.is_none());
    assert_eq!(harness.editor.view(INSTANCE).phase, BufferPhase::Editing);

    let outcome = harness.editor.key(INSTANCE, "Escape").await.expect("commit key");
    assert_eq!(applied(outcome).attributes.class_name, "flex p-3");
    assert_eq!(harness.text(INSTANCE), "flex p-3");
}

#[tokio::test(start_paused = true)]
async fn detached_refresh_reaches_views_without_blocking_commit() {
    let harness = Harness::new(EditorConfig::default());
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex");

    let outcome = harness.editor.blur(INSTANCE).await.expect("commit");
    let report = outcome.report().expect("applied commit");
    assert_eq!(report.views_signaled, 1);

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(harness.preview.refreshes(), 1);
}

#[tokio::test(start_paused = true)]
async fn failing_detached_refresh_does_not_fail_commit() {
    let harness = Harness::new(EditorConfig::default());
    let inspector = harness.views.open("inspector");
    inspector.set_failing(true);
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex gap-1");

    let outcome = harness.editor.blur(INSTANCE).await.expect("commit");
    assert_eq!(outcome.report().expect("applied commit").views_signaled, 2);

    harness.editor.wait_for_reconciliation().await;
    assert_eq!(inspector.refreshes(), 1);
    assert_eq!(harness.preview.refreshes(), 1);
    assert!(harness.notice_kinds().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failing_awaited_refresh_is_reported() {
    let harness = Harness::new(config());
    let inspector = harness.views.open("inspector");
    inspector.set_failing(true);
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex gap-2");

    applied(harness.editor.blur(INSTANCE).await);
    assert_eq!(harness.usage_events(), ["tailwind action"]);
    assert_eq!(harness.notice_kinds(), [NoticeKind::LiveViewFailure]);
}

#[tokio::test(start_paused = true)]
async fn closed_views_are_not_refreshed() {
    let harness = Harness::new(config());
    let inspector = harness.views.open("inspector");
    harness.views.close("preview");
    harness.select("div#hero").await;
    harness.edit(INSTANCE, "flex gap-3");

    let outcome = harness.editor.blur(INSTANCE).await.expect("commit");
    assert_eq!(outcome.report().expect("applied commit").views_signaled, 1);
    assert_eq!(inspector.refreshes(), 1);
    assert_eq!(harness.preview.refreshes(), 0);
}

#[tokio::test(start_paused = true)]
async fn run_follows_selection_until_feed_closes() {
    let harness = Harness::new(config());
    let editor = harness.editor.clone();
    let runner = tokio::spawn(async move { editor.run().await });

    harness.feed.select(["h1.title"]);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.text(INSTANCE), "text-xl");

    harness.feed.clear();
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.text(INSTANCE), "text-xl");
    assert!(harness.editor.view(INSTANCE).node.is_some());

    harness.feed.select(["div#hero"]);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(harness.text(INSTANCE), "flex p-4");
    assert!(harness.editor.view(ROOT).node.is_none());
    assert_eq!(harness.text(ROOT), "min-h-screen bg-white");

    let Harness { feed, .. } = harness;
    drop(feed);
    runner.await.expect("runner exits");
}

//! Release state and checklist item shapes.

use crate::steps::StepId;
use crate::version::ReleaseVersion;
use chrono::NaiveDate;

/// Checklist entry that is either done or not
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Item {
    /// Whether the task is complete
    pub done: bool,
}

/// Checklist entry that may carry a link produced by its action
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedItem {
    /// Whether the task is complete
    pub done: bool,
    /// Pull request, issue or release link
    pub url: Option<String>,
}

impl LinkedItem {
    /// Mark the item done, keeping an already recorded link when none is given
    pub fn complete(&mut self, url: Option<String>) {
        self.done = true;
        if url.is_some() {
            self.url = url;
        }
    }
}

/// Checklist entry whose action produces several links
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiLinkedItem {
    /// Whether the task is complete
    pub done: bool,
    /// Links in the order they were produced
    pub urls: Vec<String>,
}

impl MultiLinkedItem {
    /// Record a link unless it is already present
    pub fn push_url(&mut self, url: impl Into<String>) {
        let url = url.into();
        if !self.urls.contains(&url) {
            self.urls.push(url);
        }
    }
}

/// One child of an [`ItemGroup`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    /// Whether this child is complete
    pub done: bool,
    /// Link to the pull request or issue
    pub url: String,
}

/// Dynamically sized sub-checklist; complete when every child is complete
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemGroup {
    /// Parent checkbox as last written
    pub done: bool,
    /// Children in document order
    pub items: Vec<GroupEntry>,
}

impl ItemGroup {
    /// Group completion: the parent checkbox and all children
    pub fn is_done(&self) -> bool {
        self.done && self.items.iter().all(|entry| entry.done)
    }

    /// Reconcile the group with the links that are still open on the forge.
    ///
    /// Known children that are no longer open are ticked, new open links are
    /// appended, and the parent is recomputed from the children.
    pub fn refresh(&mut self, open: &[String]) {
        for entry in &mut self.items {
            entry.done = !open.contains(&entry.url);
        }
        for url in open {
            if !self.items.iter().any(|entry| &entry.url == url) {
                self.items.push(GroupEntry {
                    done: false,
                    url: url.clone(),
                });
            }
        }
        self.done = self.items.iter().all(|entry| entry.done);
    }

    /// Children that are still open
    pub fn open_items(&self) -> impl Iterator<Item = &GroupEntry> {
        self.items.iter().filter(|entry| !entry.done)
    }
}

/// Every task of the release, one field per step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Checklist {
    /// Prerequisites
    pub general_prerequisites: Item,
    /// Prerequisites
    pub slack_announcement: Item,
    /// Prerequisites
    pub check_prs_issues: ItemGroup,
    /// Pre-Release
    pub create_release_branch: LinkedItem,
    /// Pre-Release
    pub copy_branch_protection: Item,
    /// Pre-Release
    pub code_freeze: LinkedItem,
    /// Pre-Release
    pub update_snapshot_main: LinkedItem,
    /// Pre-Release
    pub create_milestone: LinkedItem,
    /// Pre-Release
    pub create_release_pr: LinkedItem,
    /// Pre-Release
    pub blog_post_pr: Item,
    /// Release
    pub merge_release_pr: Item,
    /// Release
    pub tag_release: LinkedItem,
    /// Release
    pub release_notes_main: LinkedItem,
    /// Release
    pub back_to_dev_mode: LinkedItem,
    /// Release
    pub companion_release: MultiLinkedItem,
    /// Release
    pub close_milestone: LinkedItem,
    /// Release
    pub merge_blog_post: Item,
    /// Post-Release
    pub slack_post_release: Item,
    /// Post-Release
    pub cross_post_blog: Item,
    /// Post-Release
    pub close_issue: Item,
}

/// Shared view of one checklist entry
#[derive(Debug, Clone, Copy)]
pub enum ItemRef<'a> {
    /// Plain checkbox
    Check(&'a Item),
    /// Checkbox with one link
    Linked(&'a LinkedItem),
    /// Checkbox with several links
    MultiLinked(&'a MultiLinkedItem),
    /// Checkbox with child checkboxes
    Group(&'a ItemGroup),
}

/// Mutable view of one checklist entry
#[derive(Debug)]
pub enum ItemMut<'a> {
    /// Plain checkbox
    Check(&'a mut Item),
    /// Checkbox with one link
    Linked(&'a mut LinkedItem),
    /// Checkbox with several links
    MultiLinked(&'a mut MultiLinkedItem),
    /// Checkbox with child checkboxes
    Group(&'a mut ItemGroup),
}

impl ItemRef<'_> {
    /// Completion state of the entry
    pub fn is_done(&self) -> bool {
        match self {
            ItemRef::Check(item) => item.done,
            ItemRef::Linked(item) => item.done,
            ItemRef::MultiLinked(item) => item.done,
            ItemRef::Group(group) => group.is_done(),
        }
    }

    /// Links attached to the entry, children of a group included
    pub fn links(&self) -> Vec<String> {
        match self {
            ItemRef::Check(_) => Vec::new(),
            ItemRef::Linked(item) => item.url.iter().cloned().collect(),
            ItemRef::MultiLinked(item) => item.urls.clone(),
            ItemRef::Group(group) => group
                .items
                .iter()
                .map(|entry| {
                    let mark = if entry.done { "x" } else { " " };
                    format!("[{}] {}", mark, entry.url)
                })
                .collect(),
        }
    }
}

impl ItemMut<'_> {
    /// Set the top-level checkbox
    pub fn set_done(&mut self, done: bool) {
        match self {
            ItemMut::Check(item) => item.done = done,
            ItemMut::Linked(item) => item.done = done,
            ItemMut::MultiLinked(item) => item.done = done,
            ItemMut::Group(group) => group.done = done,
        }
    }
}

impl Checklist {
    /// Entry backing a step
    pub fn item(&self, id: StepId) -> ItemRef<'_> {
        match id {
            StepId::GeneralPrerequisites => ItemRef::Check(&self.general_prerequisites),
            StepId::SlackAnnouncement => ItemRef::Check(&self.slack_announcement),
            StepId::CheckPrsIssues => ItemRef::Group(&self.check_prs_issues),
            StepId::CreateReleaseBranch => ItemRef::Linked(&self.create_release_branch),
            StepId::CopyBranchProtection => ItemRef::Check(&self.copy_branch_protection),
            StepId::CodeFreeze => ItemRef::Linked(&self.code_freeze),
            StepId::UpdateSnapshotMain => ItemRef::Linked(&self.update_snapshot_main),
            StepId::CreateMilestone => ItemRef::Linked(&self.create_milestone),
            StepId::CreateReleasePr => ItemRef::Linked(&self.create_release_pr),
            StepId::BlogPostPr => ItemRef::Check(&self.blog_post_pr),
            StepId::MergeReleasePr => ItemRef::Check(&self.merge_release_pr),
            StepId::TagRelease => ItemRef::Linked(&self.tag_release),
            StepId::ReleaseNotesMain => ItemRef::Linked(&self.release_notes_main),
            StepId::BackToDevMode => ItemRef::Linked(&self.back_to_dev_mode),
            StepId::CompanionRelease => ItemRef::MultiLinked(&self.companion_release),
            StepId::CloseMilestone => ItemRef::Linked(&self.close_milestone),
            StepId::MergeBlogPost => ItemRef::Check(&self.merge_blog_post),
            StepId::SlackPostRelease => ItemRef::Check(&self.slack_post_release),
            StepId::CrossPostBlog => ItemRef::Check(&self.cross_post_blog),
            StepId::CloseIssue => ItemRef::Check(&self.close_issue),
        }
    }

    /// Mutable entry backing a step
    pub fn item_mut(&mut self, id: StepId) -> ItemMut<'_> {
        match id {
            StepId::GeneralPrerequisites => ItemMut::Check(&mut self.general_prerequisites),
            StepId::SlackAnnouncement => ItemMut::Check(&mut self.slack_announcement),
            StepId::CheckPrsIssues => ItemMut::Group(&mut self.check_prs_issues),
            StepId::CreateReleaseBranch => ItemMut::Linked(&mut self.create_release_branch),
            StepId::CopyBranchProtection => ItemMut::Check(&mut self.copy_branch_protection),
            StepId::CodeFreeze => ItemMut::Linked(&mut self.code_freeze),
            StepId::UpdateSnapshotMain => ItemMut::Linked(&mut self.update_snapshot_main),
            StepId::CreateMilestone => ItemMut::Linked(&mut self.create_milestone),
            StepId::CreateReleasePr => ItemMut::Linked(&mut self.create_release_pr),
            StepId::BlogPostPr => ItemMut::Check(&mut self.blog_post_pr),
            StepId::MergeReleasePr => ItemMut::Check(&mut self.merge_release_pr),
            StepId::TagRelease => ItemMut::Linked(&mut self.tag_release),
            StepId::ReleaseNotesMain => ItemMut::Linked(&mut self.release_notes_main),
            StepId::BackToDevMode => ItemMut::Linked(&mut self.back_to_dev_mode),
            StepId::CompanionRelease => ItemMut::MultiLinked(&mut self.companion_release),
            StepId::CloseMilestone => ItemMut::Linked(&mut self.close_milestone),
            StepId::MergeBlogPost => ItemMut::Check(&mut self.merge_blog_post),
            StepId::SlackPostRelease => ItemMut::Check(&mut self.slack_post_release),
            StepId::CrossPostBlog => ItemMut::Check(&mut self.cross_post_blog),
            StepId::CloseIssue => ItemMut::Check(&mut self.close_issue),
        }
    }
}

/// Complete in-memory state of one release.
///
/// Reconstructed from the release issue on every run and discarded at exit;
/// the issue body is the only persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseState {
    /// Version being released
    pub release: ReleaseVersion,
    /// Companion project version released in lockstep, without `v`; empty when none
    pub companion_release: String,
    /// Scheduled release date
    pub date: NaiveDate,
    /// Progress of every task
    pub checklist: Checklist,
}

impl ReleaseState {
    /// Fresh state with nothing done; a leading `v` on the companion release is dropped
    pub fn new(release: ReleaseVersion, date: NaiveDate, companion_release: impl Into<String>) -> Self {
        let companion_release = companion_release.into();
        Self {
            release,
            companion_release: companion_release.trim().trim_start_matches('v').to_string(),
            date,
            checklist: Checklist::default(),
        }
    }

    /// Release candidate increment (0 = not an RC)
    pub fn rc(&self) -> u32 {
        self.release.rc()
    }

    /// General availability release
    pub fn is_ga(&self) -> bool {
        self.release.is_ga()
    }

    /// Whether a companion release is tracked alongside this one
    pub fn has_companion_release(&self) -> bool {
        !self.companion_release.is_empty()
    }

    /// Issue title for this release
    pub fn title(&self) -> String {
        self.release.title()
    }
}

//! Deferred Request Queue.
//!
//! Rechecks push follow-up work here instead of recursing; a flush drains the
//! queue generation by generation until it stays empty.

use rustc_hash::FxHashSet;

use kiln_common::FileHandle;

/// Files to re-parse into the environment, and files to re-analyze.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecheckRequest {
    pub update_files: Vec<FileHandle>,
    pub check_files: Vec<FileHandle>,
}

impl RecheckRequest {
    pub fn new(update_files: Vec<FileHandle>, check_files: Vec<FileHandle>) -> Self {
        Self {
            update_files,
            check_files,
        }
    }

    /// Re-analyze `check_files` without re-parsing anything.
    pub fn check_only(check_files: Vec<FileHandle>) -> Self {
        Self::new(Vec::new(), check_files)
    }

    pub fn is_empty(&self) -> bool {
        self.update_files.is_empty() && self.check_files.is_empty()
    }

    /// Merge `requests` into one, concatenating in queue order.
    ///
    /// A file listed by several requests keeps its first position.
    pub fn flatten(requests: impl IntoIterator<Item = RecheckRequest>) -> Self {
        let mut merged = RecheckRequest::default();
        let mut seen_update: FxHashSet<FileHandle> = FxHashSet::default();
        let mut seen_check: FxHashSet<FileHandle> = FxHashSet::default();
        for request in requests {
            for handle in request.update_files {
                if seen_update.insert(handle.clone()) {
                    merged.update_files.push(handle);
                }
            }
            for handle in request.check_files {
                if seen_check.insert(handle.clone()) {
                    merged.check_files.push(handle);
                }
            }
        }
        merged
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeferredQueue {
    requests: Vec<RecheckRequest>,
}

impl DeferredQueue {
    pub fn push(&mut self, request: RecheckRequest) {
        self.requests.push(request);
    }

    /// Remove and return everything queued so far, oldest first.
    pub fn take(&mut self) -> Vec<RecheckRequest> {
        std::mem::take(&mut self.requests)
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecheckRequest> {
        self.requests.iter()
    }

    pub fn clear(&mut self) {
        self.requests.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(path: &str) -> FileHandle {
        FileHandle::new(path).unwrap()
    }

    #[test]
    fn test_take_drains_in_order() {
        let mut queue = DeferredQueue::default();
        queue.push(RecheckRequest::check_only(vec![h("a.kiln")]));
        queue.push(RecheckRequest::check_only(vec![h("b.kiln")]));

        let taken = queue.take();
        assert!(queue.is_empty());
        assert_eq!(taken.len(), 2);
        assert_eq!(taken[0].check_files, vec![h("a.kiln")]);
        assert_eq!(taken[1].check_files, vec![h("b.kiln")]);
    }

    #[test]
    fn test_flatten_concatenates_and_keeps_first_occurrence() {
        let merged = RecheckRequest::flatten(vec![
            RecheckRequest::new(vec![h("x.kiln")], vec![h("b.kiln"), h("a.kiln")]),
            RecheckRequest::check_only(vec![h("c.kiln"), h("b.kiln")]),
        ]);
        assert_eq!(merged.update_files, vec![h("x.kiln")]);
        assert_eq!(
            merged.check_files,
            vec![h("b.kiln"), h("a.kiln"), h("c.kiln")]
        );
    }

    #[test]
    fn test_flatten_of_nothing_is_empty() {
        assert!(RecheckRequest::flatten(Vec::new()).is_empty());
    }
}

use std::collections::VecDeque;
use std::rc::Rc;

use super::descriptor::InlineScene;
use super::handler::SceneProc;

/// Where a queued scene's descriptor comes from.
#[derive(Debug, Clone)]
pub enum SceneSource {
    /// The value is the descriptor's own resource id.
    Resource(u16),
    /// The value is a logical scene index resolved through the lookup table.
    Scene(u16),
    /// Descriptor and resource list are already resident; the caller keeps them.
    Descriptor(Rc<InlineScene>),
}

#[derive(Debug, Clone)]
pub struct SceneQueueEntry {
    pub source: SceneSource,
    pub handler: SceneProc,
    pub skip_target: bool,
}

impl SceneQueueEntry {
    pub fn new(source: SceneSource) -> Self {
        Self {
            source,
            handler: SceneProc::Default,
            skip_target: false,
        }
    }

    pub fn with_handler(mut self, handler: SceneProc) -> Self {
        self.handler = handler;
        self
    }

    pub fn as_skip_target(mut self) -> Self {
        self.skip_target = true;
        self
    }
}

/// Pending scene transitions. The head is the scene currently playing.
#[derive(Debug, Default)]
pub struct SceneQueue {
    entries: VecDeque<SceneQueueEntry>,
}

impl SceneQueue {
    pub fn enqueue(&mut self, entry: SceneQueueEntry) {
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn head(&self) -> Option<&SceneQueueEntry> {
        self.entries.front()
    }

    pub fn pop_head(&mut self) -> Option<SceneQueueEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SceneQueueEntry> {
        self.entries.iter()
    }

    /// Position of the first skip target after the head.
    pub fn find_first_skip_target(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .skip(1)
            .find(|(_, entry)| entry.skip_target)
            .map(|(position, _)| position)
    }

    /// Removes every entry before `position`, leaving that entry as the head.
    pub fn drop_before(&mut self, position: usize) {
        let count = position.min(self.entries.len());
        self.entries.drain(..count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(index: u16) -> SceneQueueEntry {
        SceneQueueEntry::new(SceneSource::Scene(index))
    }

    fn heads(queue: &SceneQueue) -> Vec<u16> {
        queue
            .iter()
            .map(|entry| match entry.source {
                SceneSource::Scene(index) | SceneSource::Resource(index) => index,
                SceneSource::Descriptor(_) => 0,
            })
            .collect()
    }

    #[test]
    fn enqueue_appends_and_pop_takes_from_head() {
        let mut queue = SceneQueue::default();
        queue.enqueue(scene(1));
        queue.enqueue(scene(2));

        assert_eq!(heads(&queue), vec![1, 2]);
        assert!(queue.pop_head().is_some());
        assert_eq!(heads(&queue), vec![2]);
        queue.clear();
        assert!(queue.is_empty());
        assert!(queue.pop_head().is_none());
    }

    #[test]
    fn head_is_never_a_skip_target() {
        let mut queue = SceneQueue::default();
        queue.enqueue(scene(1).as_skip_target());
        assert_eq!(queue.find_first_skip_target(), None);

        queue.enqueue(scene(2));
        assert_eq!(queue.find_first_skip_target(), None);
    }

    #[test]
    fn finds_first_flagged_entry_after_head() {
        let mut queue = SceneQueue::default();
        queue.enqueue(scene(1));
        queue.enqueue(scene(2));
        queue.enqueue(scene(3).as_skip_target());
        queue.enqueue(scene(4).as_skip_target());

        assert_eq!(queue.find_first_skip_target(), Some(2));
    }

    #[test]
    fn drop_before_makes_target_the_head() {
        let mut queue = SceneQueue::default();
        for index in 1..=4 {
            queue.enqueue(scene(index));
        }

        queue.drop_before(2);

        assert_eq!(heads(&queue), vec![3, 4]);
        queue.drop_before(10);
        assert!(queue.is_empty());
    }
}

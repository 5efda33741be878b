//! Two-cursor duplication of a lazy result stream.
//!
//! The profiling instrument must drain a lazy stream inside the profiler
//! scope without consuming the caller's copy. `tee` splits a stream into
//! two independent cursors over a shared buffered source: items are pulled
//! from the source on first demand and replayed from the buffer for the
//! cursor that is behind.

use crate::domain::errors::RoutineFailure;
use crate::routine::{ResultItem, ResultStream};
use std::cell::RefCell;
use std::rc::Rc;

type Produced = Result<ResultItem, RoutineFailure>;

struct TeeShared {
    source: ResultStream,
    cache: Vec<Produced>,
    exhausted: bool,
}

/// One independent read cursor over the shared source.
pub struct TeeCursor {
    shared: Rc<RefCell<TeeShared>>,
    position: usize,
}

/// Split `stream` into two independent cursors.
#[must_use]
pub fn tee(stream: ResultStream) -> (TeeCursor, TeeCursor) {
    let shared = Rc::new(RefCell::new(TeeShared {
        source: stream,
        cache: Vec::new(),
        exhausted: false,
    }));
    (
        TeeCursor { shared: Rc::clone(&shared), position: 0 },
        TeeCursor { shared, position: 0 },
    )
}

impl Iterator for TeeCursor {
    type Item = Produced;

    fn next(&mut self) -> Option<Produced> {
        let mut shared = self.shared.borrow_mut();
        if self.position == shared.cache.len() {
            if shared.exhausted {
                return None;
            }
            match shared.source.next() {
                Some(item) => shared.cache.push(item),
                None => {
                    shared.exhausted = true;
                    return None;
                }
            }
        }
        let item = shared.cache[self.position].clone();
        self.position += 1;
        Some(item)
    }
}

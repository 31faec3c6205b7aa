use std::fmt;

/// Tag carried by every fetch. Drawn from one monotonic counter per `FeedState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

impl Generation {
    pub(crate) fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct InFlight {
    pub generation: Generation,
    pub page: u32,
}

/// What a completion turned out to be, relative to the pager's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Arrival {
    /// The awaited response. `reset` must be honoured by the merge.
    Current { reset: bool },
    Stale,
}

/// Which page to fetch next and which response is still awaited.
///
/// Replaces ambient "current page" state: a response is only accepted when its
/// generation matches the single in-flight request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Pager {
    next_page: u32,
    in_flight: Option<InFlight>,
    reset_requested: bool,
    exhausted: bool,
}

impl Default for Pager {
    fn default() -> Self {
        Self {
            next_page: 1,
            in_flight: None,
            reset_requested: false,
            exhausted: false,
        }
    }
}

impl Pager {
    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    pub fn is_loading_first_page(&self) -> bool {
        matches!(self.in_flight, Some(InFlight { page: 1, .. }))
    }

    #[cfg(test)]
    pub fn reset_requested(&self) -> bool {
        self.reset_requested
    }

    /// Marks the accumulated snapshot stale without fetching yet.
    pub fn invalidate(&mut self) {
        self.reset_requested = true;
        self.next_page = 1;
        self.exhausted = false;
    }

    /// Plans the next sequential fetch, or `None` when one is in flight or the end was reached.
    pub fn begin_next(&mut self, generation: Generation) -> Option<InFlight> {
        if self.in_flight.is_some() {
            return None;
        }
        if self.exhausted && !self.reset_requested {
            return None;
        }
        if self.reset_requested {
            self.next_page = 1;
        }
        let request = InFlight {
            generation,
            page: self.next_page,
        };
        self.in_flight = Some(request);
        Some(request)
    }

    /// Starts over from page 1, superseding whatever is in flight.
    ///
    /// Returns the superseded request so the caller can cancel it.
    pub fn begin_reset(&mut self, generation: Generation) -> (InFlight, Option<InFlight>) {
        let superseded = self.in_flight.take();
        self.invalidate();
        let request = InFlight {
            generation,
            page: 1,
        };
        self.in_flight = Some(request);
        (request, superseded)
    }

    /// Classifies a successful response. A current response consumes the reset flag.
    pub fn accept(&mut self, generation: Generation, page: u32, has_more: bool) -> Arrival {
        match self.in_flight {
            Some(request) if request.generation == generation && request.page == page => {
                self.in_flight = None;
                self.next_page = page + 1;
                self.exhausted = !has_more;
                let reset = std::mem::take(&mut self.reset_requested);
                Arrival::Current { reset }
            }
            _ => Arrival::Stale,
        }
    }

    /// Clears the in-flight marker after a failure or cancellation.
    ///
    /// Returns `false` when the generation was already superseded.
    pub fn settle(&mut self, generation: Generation) -> bool {
        match self.in_flight {
            Some(request) if request.generation == generation => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }
}

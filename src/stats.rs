use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected while reading a dump
#[derive(Debug, Default)]
pub struct ReadStats {
    pub pages_read: AtomicU64,
    pub pages_dispatched: AtomicU64,
    pub redirects_skipped: AtomicU64,
    pub empty_titles: AtomicU64,
    pub out_of_order_revisions: AtomicU64,
    pub invalid_ids: AtomicU64,
    pub handler_errors: AtomicU64,
    pub xml_errors: AtomicU64,
}

impl ReadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_pages(&self) -> u64 {
        self.pages_read.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn inc_dispatched(&self) {
        self.pages_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_redirects_skipped(&self) {
        self.redirects_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_empty_titles(&self) {
        self.empty_titles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_out_of_order(&self) {
        self.out_of_order_revisions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_invalid_ids(&self) {
        self.invalid_ids.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_handler_errors(&self) {
        self.handler_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_xml_errors(&self) {
        self.xml_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pages(&self) -> u64 {
        self.pages_read.load(Ordering::Relaxed)
    }

    pub fn dispatched(&self) -> u64 {
        self.pages_dispatched.load(Ordering::Relaxed)
    }

    pub fn redirects(&self) -> u64 {
        self.redirects_skipped.load(Ordering::Relaxed)
    }

    pub fn empty_titles(&self) -> u64 {
        self.empty_titles.load(Ordering::Relaxed)
    }

    pub fn out_of_order(&self) -> u64 {
        self.out_of_order_revisions.load(Ordering::Relaxed)
    }

    pub fn invalid_ids(&self) -> u64 {
        self.invalid_ids.load(Ordering::Relaxed)
    }

    pub fn handler_errors(&self) -> u64 {
        self.handler_errors.load(Ordering::Relaxed)
    }

    pub fn xml_errors(&self) -> u64 {
        self.xml_errors.load(Ordering::Relaxed)
    }

    /// Prints the end-of-run summary block.
    pub fn print_summary(&self) {
        println!("Pages read:         {}", self.pages());
        println!("Pages dispatched:   {}", self.dispatched());
        println!("Redirects skipped:  {}", self.redirects());
        println!("Empty titles:       {}", self.empty_titles());
        println!("Out-of-order revs:  {}", self.out_of_order());
        println!("Invalid ids:        {}", self.invalid_ids());
        println!("Handler errors:     {}", self.handler_errors());
        println!("XML errors:         {}", self.xml_errors());
    }
}

use crate::error::{ErrorKind, Result};
use std::collections::{HashSet, VecDeque};
use url::{Origin, Url};

/// One page to visit, `depth` links away from the seed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub depth: u32,
}

/// Breadth-first crawl scheduler scoped to the seed's origin.
///
/// The queue may hold the same URL more than once; duplicates are dropped when
/// popped, so only URLs actually visited count against `max_pages`.
#[derive(Debug)]
pub struct Frontier {
    seed: Url,
    origin: Origin,
    queue: VecDeque<CrawlTask>,
    visited: HashSet<Url>,
    max_depth: u32,
    max_pages: usize,
}

impl Frontier {
    /// Creates a frontier holding only the seed, at depth 0.
    pub fn new(seed: &str, max_depth: u32, max_pages: usize) -> Result<Self> {
        let Some(seed) = normalize(seed) else {
            exn::bail!(ErrorKind::InvalidUrl(seed.to_string()));
        };
        let origin = seed.origin();
        let queue = VecDeque::from([CrawlTask {
            url: seed.clone(),
            depth: 0,
        }]);
        Ok(Self {
            seed,
            origin,
            queue,
            visited: HashSet::new(),
            max_depth,
            max_pages,
        })
    }

    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Pops the next unvisited same-origin task and marks it visited.
    ///
    /// Returns `None` once the queue is drained or `max_pages` URLs have been
    /// handed out.
    pub fn next(&mut self) -> Option<CrawlTask> {
        while self.visited.len() < self.max_pages {
            let task = self.queue.pop_front()?;
            if self.visited.contains(&task.url) {
                continue;
            }
            if task.url.origin() != self.origin {
                tracing::trace!(url = %task.url, "Skipping off-origin URL");
                continue;
            }
            self.visited.insert(task.url.clone());
            return Some(task);
        }
        None
    }

    /// Whether links found on a page at `depth` would be followed at all.
    pub fn wants_links(&self, depth: u32) -> bool {
        depth < self.max_depth
    }

    /// Queues links found on a page at `parent_depth`, returning how many were
    /// accepted.
    ///
    /// Links are accepted when they parse as absolute HTTP(S) URLs on the seed
    /// origin and have not been visited yet. Fragments are stripped first, so
    /// `/page#a` and `/page#b` are the same page.
    pub fn discover(&mut self, links: impl IntoIterator<Item = impl AsRef<str>>, parent_depth: u32) -> usize {
        if !self.wants_links(parent_depth) {
            return 0;
        }
        let depth = parent_depth + 1;
        let mut accepted = 0;
        for link in links {
            let link = link.as_ref();
            let Some(url) = normalize(link) else {
                tracing::trace!(link, "Discarding unparseable link");
                continue;
            };
            if url.origin() != self.origin {
                tracing::trace!(link, "Discarding off-origin link");
                continue;
            }
            if self.visited.contains(&url) {
                continue;
            }
            self.queue.push_back(CrawlTask { url, depth });
            accepted += 1;
        }
        accepted
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty() || self.visited.len() >= self.max_pages
    }
}

fn normalize(raw: &str) -> Option<Url> {
    let mut url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

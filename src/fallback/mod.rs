use tracing::{debug, warn};

use crate::errors::DigestResult;

type FetchFn<'a, T> = Box<dyn FnMut() -> DigestResult<Vec<T>> + 'a>;

struct Stage<'a, T> {
    name: &'static str,
    fetch: FetchFn<'a, T>,
}

/// Ordered chain of data sources for one domain.
///
/// Sources are tried strictly in registration order. An error or an empty
/// result means "this source contributed nothing" and never aborts the
/// chain; exhaustion yields an empty result the caller degrades from.
pub struct FallbackChain<'a, T> {
    domain: &'static str,
    stages: Vec<Stage<'a, T>>,
}

impl<'a, T> FallbackChain<'a, T> {
    pub fn new(domain: &'static str) -> Self {
        Self {
            domain,
            stages: Vec::new(),
        }
    }

    pub fn stage(
        mut self,
        name: &'static str,
        fetch: impl FnMut() -> DigestResult<Vec<T>> + 'a,
    ) -> Self {
        self.stages.push(Stage {
            name,
            fetch: Box::new(fetch),
        });
        self
    }

    fn run_stage(domain: &str, stage: &mut Stage<'a, T>) -> Vec<T> {
        match (stage.fetch)() {
            Ok(items) if !items.is_empty() => {
                debug!(domain, source = stage.name, count = items.len(), "source contributed");
                items
            }
            Ok(_) => {
                debug!(domain, source = stage.name, "source returned nothing");
                Vec::new()
            }
            Err(e) => {
                warn!(domain, source = stage.name, error = %e, "source failed, continuing chain");
                Vec::new()
            }
        }
    }

    /// Short-circuit on the first source that yields a non-empty result.
    pub fn first_success(mut self) -> Vec<T> {
        for stage in &mut self.stages {
            let items = Self::run_stage(self.domain, stage);
            if !items.is_empty() {
                return items;
            }
        }
        warn!(domain = self.domain, "all sources exhausted");
        Vec::new()
    }

    /// Query every source and merge the contributions in order.
    pub fn accumulate(mut self) -> Vec<T> {
        let mut merged = Vec::new();
        for stage in &mut self.stages {
            merged.extend(Self::run_stage(self.domain, stage));
        }
        if merged.is_empty() {
            warn!(domain = self.domain, "all sources exhausted");
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::DigestError;

    #[test]
    fn test_first_success_skips_failing_sources() {
        let result = FallbackChain::new("test")
            .stage("broken", || Err(DigestError::Upstream("boom".into())))
            .stage("working", || Ok(vec![2]))
            .stage("never-reached", || Ok(vec![3]))
            .first_success();

        assert_eq!(result, vec![2]);
    }

    #[test]
    fn test_first_success_skips_empty_sources() {
        let result = FallbackChain::new("test")
            .stage("empty", || Ok(Vec::<i32>::new()))
            .stage("working", || Ok(vec![7]))
            .first_success();

        assert_eq!(result, vec![7]);
    }

    #[test]
    fn test_exhaustion_returns_empty_without_error() {
        let result: Vec<i32> = FallbackChain::new("test")
            .stage("a", || Err(DigestError::Upstream("down".into())))
            .stage("b", || Ok(Vec::new()))
            .first_success();

        assert!(result.is_empty());
    }

    #[test]
    fn test_accumulate_merges_all_contributions() {
        let result = FallbackChain::new("test")
            .stage("first", || Ok(vec![1, 2]))
            .stage("broken", || Err(DigestError::Upstream("down".into())))
            .stage("second", || Ok(vec![3]))
            .accumulate();

        assert_eq!(result, vec![1, 2, 3]);
    }

    #[test]
    fn test_stages_capture_environment() {
        let mut calls = 0;
        let result = FallbackChain::new("test")
            .stage("counting", || {
                calls += 1;
                Ok(vec![calls])
            })
            .first_success();
        assert_eq!(result, vec![1]);
    }
}

/// Effective loop bounds for one run, after the pagination plan and the
/// environment ceilings have been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Outer pagination bound (page count).
    pub paginate_limit: u32,
    /// Item window size; 0 means no inner window.
    pub items_on_page: u32,
}

impl Limits {
    /// Total step-loop iterations: every page repeats the flow once per
    /// item-window slot.
    pub fn effective(&self) -> u32 {
        self.items_on_page.max(1) * self.paginate_limit
    }

    /// True when iteration `paginate_index` sits on an item-window boundary
    /// where the page must advance before the flow runs again.
    pub fn advance_at(&self, paginate_index: u32) -> bool {
        self.items_on_page > 0
            && paginate_index > 0
            && paginate_index % self.items_on_page == 0
            && paginate_index < self.effective()
    }
}

/// Ceilings read from the environment; `None` leaves a limit unclamped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ceilings {
    pub max_paginate_limit: Option<u32>,
    pub max_items_on_page: Option<u32>,
}

impl Ceilings {
    pub fn from_env() -> Self {
        let read = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|value| value.parse::<u32>().ok())
        };
        Self {
            max_paginate_limit: read("MAX_PAGINATE_LIMIT"),
            max_items_on_page: read("MAX_ITEMS_ON_PAGE"),
        }
    }
}

/// Compute the run's limits from the request. Pagination enables the outer
/// loop; infinite scrolling overrides it when both are set. Ceiling
/// reductions are reported as recoverable errors, never as failures.
pub fn compute(
    config: &crate::flow::FlowConfig,
    ceilings: Ceilings,
    errors: &mut Vec<String>,
) -> Limits {
    let mut paginate_limit = 1;

    if config.paginate && config.paginate_limit > 0 {
        paginate_limit = config.paginate_limit;
    }

    if config.infinite && config.infinite_scroll > 0 {
        paginate_limit = config.infinite_scroll;
    }

    if let Some(ceiling) = ceilings.max_paginate_limit {
        if paginate_limit > ceiling {
            errors.push(format!(
                "Maximum pagination only {} times, but requested {} times",
                ceiling, paginate_limit
            ));
            paginate_limit = ceiling;
        }
    }

    let mut items_on_page = config.items_on_page;

    if let Some(ceiling) = ceilings.max_items_on_page {
        if items_on_page > ceiling {
            errors.push(format!(
                "Maximum items on page only {} items, but requested {} items",
                ceiling, items_on_page
            ));
            items_on_page = ceiling;
        }
    }

    Limits {
        paginate_limit,
        items_on_page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::FlowConfig;

    fn config() -> FlowConfig {
        FlowConfig::default()
    }

    #[test]
    fn defaults_to_a_single_page() {
        let mut errors = Vec::new();
        let limits = compute(&config(), Ceilings::default(), &mut errors);
        assert_eq!(limits.paginate_limit, 1);
        assert_eq!(limits.items_on_page, 0);
        assert_eq!(limits.effective(), 1);
        assert!(errors.is_empty());
    }

    #[test]
    fn paginate_limit_applies_when_enabled() {
        let mut request = config();
        request.paginate = true;
        request.paginate_limit = 4;
        let mut errors = Vec::new();
        let limits = compute(&request, Ceilings::default(), &mut errors);
        assert_eq!(limits.paginate_limit, 4);
    }

    #[test]
    fn infinite_overrides_pagination() {
        let mut request = config();
        request.paginate = true;
        request.paginate_limit = 4;
        request.infinite = true;
        request.infinite_scroll = 9;
        let mut errors = Vec::new();
        let limits = compute(&request, Ceilings::default(), &mut errors);
        assert_eq!(limits.paginate_limit, 9);
    }

    #[test]
    fn ceilings_clamp_and_report() {
        let mut request = config();
        request.paginate = true;
        request.paginate_limit = 5;
        request.items_on_page = 8;
        let ceilings = Ceilings {
            max_paginate_limit: Some(2),
            max_items_on_page: Some(3),
        };
        let mut errors = Vec::new();
        let limits = compute(&request, ceilings, &mut errors);
        assert_eq!(limits.paginate_limit, 2);
        assert_eq!(limits.items_on_page, 3);
        assert_eq!(
            errors,
            vec![
                "Maximum pagination only 2 times, but requested 5 times".to_string(),
                "Maximum items on page only 3 items, but requested 8 items".to_string(),
            ]
        );
    }

    #[test]
    fn effective_multiplies_window_by_pages() {
        let limits = Limits {
            paginate_limit: 3,
            items_on_page: 5,
        };
        assert_eq!(limits.effective(), 15);

        let no_window = Limits {
            paginate_limit: 3,
            items_on_page: 0,
        };
        assert_eq!(no_window.effective(), 3);
    }

    #[test]
    fn advance_happens_only_on_interior_window_boundaries() {
        let limits = Limits {
            paginate_limit: 3,
            items_on_page: 2,
        };
        let advances: Vec<u32> = (0..limits.effective())
            .filter(|index| limits.advance_at(*index))
            .collect();
        // Boundaries at 2 and 4; never at 0 and never past the end.
        assert_eq!(advances, vec![2, 4]);
    }

    #[test]
    fn single_item_window_advances_every_iteration_after_the_first() {
        // infinite_scroll=3 with items_on_page=1 visits three pages and
        // advances before iterations 1 and 2.
        let limits = Limits {
            paginate_limit: 3,
            items_on_page: 1,
        };
        let advances: Vec<u32> = (0..limits.effective())
            .filter(|index| limits.advance_at(*index))
            .collect();
        assert_eq!(advances, vec![1, 2]);
    }

    #[test]
    fn no_window_never_advances() {
        let limits = Limits {
            paginate_limit: 4,
            items_on_page: 0,
        };
        assert!((0..limits.effective()).all(|index| !limits.advance_at(index)));
    }
}

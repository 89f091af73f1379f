// ==========================================
// 餐饮出品编排系统 - 路由规则判定器
// ==========================================
// 规则: 停用/服务方式不符 → 不匹配
// 规则: 任一否决谓词命中 → 不匹配（先于正向谓词判定）
// 规则: 无正向谓词 → 匹配；ALL 需全部成立，ANY 需至少一个成立
// 红线: 纯函数，无副作用
// ==========================================

use crate::domain::order::Order;
use crate::domain::station::{PredicateTarget, StationRule};
use crate::domain::types::{PredicateMode, ServiceMode, MatchMode};
use crate::engine::catalog::Catalog;
use std::collections::BTreeSet;

// ==========================================
// OrderProfile - 订单画像（品类/标签/服务方式）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderProfile {
    pub categories: BTreeSet<String>,
    pub tags: BTreeSet<String>,
    pub service_mode: ServiceMode,
}

impl OrderProfile {
    /// 由订单 + 目录构建画像（目录缺失的品项不贡献品类/标签）
    pub fn from_order(order: &Order, catalog: &Catalog) -> Self {
        let mut categories = BTreeSet::new();
        let mut tags = BTreeSet::new();
        for item_id in order.item_ids() {
            if let Some(item) = catalog.get(item_id) {
                categories.insert(item.category.clone());
                for tag in &item.tags {
                    tags.insert(tag.clone());
                }
            }
        }
        Self {
            categories,
            tags,
            service_mode: order.service_mode,
        }
    }

    fn holds(&self, target: &PredicateTarget) -> bool {
        match target {
            PredicateTarget::Category(c) => self.categories.contains(c),
            PredicateTarget::Tag(t) => self.tags.contains(t),
        }
    }
}

/// 规则判定结果（保留原因供可解释性）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleDecision {
    Disabled,
    ServiceModeMismatch,
    Vetoed(PredicateTarget),
    Unconditional,
    Matched,
    NotMatched,
}

impl RuleDecision {
    pub fn is_match(&self) -> bool {
        matches!(self, RuleDecision::Unconditional | RuleDecision::Matched)
    }
}

/// RoutingPolicyEvaluator - 路由规则判定器
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingPolicyEvaluator;

impl RoutingPolicyEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// 判定规则是否匹配订单
    ///
    /// # 参数
    /// - `rule`: 工位规则
    /// - `categories`: 订单品类集合
    /// - `tags`: 订单标签集合
    /// - `service_mode`: 订单服务方式
    pub fn matches(
        &self,
        rule: &StationRule,
        categories: &BTreeSet<String>,
        tags: &BTreeSet<String>,
        service_mode: ServiceMode,
    ) -> bool {
        let profile = OrderProfile {
            categories: categories.clone(),
            tags: tags.clone(),
            service_mode,
        };
        self.evaluate(rule, &profile).is_match()
    }

    /// 判定并返回原因
    pub fn evaluate(&self, rule: &StationRule, profile: &OrderProfile) -> RuleDecision {
        if !rule.enabled {
            return RuleDecision::Disabled;
        }

        if !rule.service_modes.is_empty() && !rule.service_modes.contains(&profile.service_mode) {
            return RuleDecision::ServiceModeMismatch;
        }

        // 否决优先
        if let Some(vetoed) = rule
            .predicates
            .iter()
            .filter(|p| p.mode == PredicateMode::Exclude)
            .find(|p| profile.holds(&p.target))
        {
            return RuleDecision::Vetoed(vetoed.target.clone());
        }

        let positives: Vec<bool> = rule
            .predicates
            .iter()
            .filter(|p| p.mode == PredicateMode::Require)
            .map(|p| profile.holds(&p.target))
            .collect();

        if positives.is_empty() {
            return RuleDecision::Unconditional;
        }

        let matched = match rule.match_mode {
            MatchMode::All => positives.iter().all(|h| *h),
            MatchMode::Any => positives.iter().any(|h| *h),
        };

        if matched {
            RuleDecision::Matched
        } else {
            RuleDecision::NotMatched
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::station::RulePredicate;
    use crate::domain::types::ModuleKind;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_unconditional_station_accepts_anything() {
        let evaluator = RoutingPolicyEvaluator::new();
        let rule = StationRule::open("G1", ModuleKind::Griddle);
        assert!(evaluator.matches(&rule, &set(&[]), &set(&[]), ServiceMode::DineIn));
    }

    #[test]
    fn test_ignore_predicates_do_not_count_as_positive() {
        let evaluator = RoutingPolicyEvaluator::new();
        let mut rule = StationRule::open("G1", ModuleKind::Griddle);
        rule.predicates.push(RulePredicate {
            target: PredicateTarget::Category("potsticker".to_string()),
            mode: PredicateMode::Ignore,
        });
        let profile = OrderProfile {
            categories: set(&["noodle"]),
            tags: set(&[]),
            service_mode: ServiceMode::Takeout,
        };
        assert_eq!(evaluator.evaluate(&rule, &profile), RuleDecision::Unconditional);
    }

    #[test]
    fn test_veto_wins_over_positive_match() {
        let evaluator = RoutingPolicyEvaluator::new();
        let rule = StationRule::open("N1", ModuleKind::Noodle)
            .with_predicate(RulePredicate::require_category("noodle"))
            .with_predicate(RulePredicate::exclude_tag("spicy"));
        let profile = OrderProfile {
            categories: set(&["noodle"]),
            tags: set(&["spicy"]),
            service_mode: ServiceMode::Takeout,
        };
        assert_eq!(
            evaluator.evaluate(&rule, &profile),
            RuleDecision::Vetoed(PredicateTarget::Tag("spicy".to_string()))
        );
    }
}

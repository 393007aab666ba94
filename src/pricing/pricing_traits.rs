use crate::errors::Result;
use crate::pricing::pricing_model::{
    BasePrice, PriceQuoteRequest, PriceQuoteResult, Profile, ProfileRuleRow,
};

/// Contract the pricing engine needs from the rule store.
///
/// The store itself (SQL catalog of articles, prices and rules) lives outside
/// this crate; the engine only reads through this boundary, once per quote.
pub trait RuleStoreTrait: Send + Sync {
    /// Base prices of one article, at most one per currency.
    fn get_base_prices(&self, article: &str) -> Result<Vec<BasePrice>>;

    /// Raw exchange-rate setting (LOCAL per USD) as stored. The engine
    /// parses it and falls back to a fixed default when absent or garbage.
    fn get_exchange_rate(&self) -> Result<Option<String>>;

    /// Ids of profiles assigned to one client.
    fn get_client_assigned_profiles(&self, client_id: &str) -> Result<Vec<String>>;

    /// Ids of profiles marked globally active.
    fn get_global_profiles(&self) -> Result<Vec<String>>;

    /// Profile rows for a set of ids; unknown ids are simply absent from the
    /// result.
    fn get_profiles(&self, ids: &[String]) -> Result<Vec<Profile>>;

    /// Rule rows of the given profiles that target the article or ALL.
    fn get_profile_rules(
        &self,
        profile_ids: &[String],
        article: &str,
    ) -> Result<Vec<ProfileRuleRow>>;

    /// Ad-hoc exception rows scoped directly to one client + article.
    fn get_client_exception_rules(
        &self,
        client_id: &str,
        article: &str,
    ) -> Result<Vec<ProfileRuleRow>>;
}

/// Trait defining the contract for pricing service operations.
pub trait PricingServiceTrait: Send + Sync {
    /// Computes one price quote. Pure function of the request plus one
    /// point-in-time rule store read.
    fn calculate_price(&self, request: &PriceQuoteRequest) -> Result<PriceQuoteResult>;

    /// Prices several requests under one exchange-rate snapshot.
    fn calculate_price_batch(
        &self,
        requests: &[PriceQuoteRequest],
    ) -> Result<Vec<PriceQuoteResult>>;
}

//! Paginated Pokemon list coordinator
//!
//! Loads pages of summaries from a [`provider::PokemonProvider`], fans out
//! detail fetches for every new entry and merges the results into a single
//! observable [`state::ViewState`].

pub mod action;
pub mod api;
pub mod effect;
pub mod pager;
pub mod provider;
pub mod reducer;
pub mod state;

mod interaction;
mod view;

pub(in crate::app) use view::fuzzy_match_score;

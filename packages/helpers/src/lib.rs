pub mod answer;
pub mod fsm;
pub mod validation;

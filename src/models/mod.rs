pub mod answer;
pub mod choice;
pub mod poll;
pub mod question;
pub mod results;
pub mod seed;
pub mod vote;

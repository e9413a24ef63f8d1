pub mod history_table;
pub mod menu;
pub mod progress_bar;
pub mod question_card;
pub mod question_nav;
pub mod result_card;
pub mod wizard;

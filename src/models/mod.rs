pub mod answer;
pub mod cookie;
pub mod question;
pub mod selector;

pub use answer::{Answer, AnswerOutcome, OutcomeResult, ParsedAnswer, SolveReport};
pub use cookie::StoredCookie;
pub use question::{option_letter, ControlRef, Modality, OptionSummary, Question, QuestionOption, QuestionSummary};
pub use selector::{NodeAttributes, Predicate, Selector};

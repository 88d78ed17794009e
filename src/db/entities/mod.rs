//! Database entities

pub mod answer;
pub mod answer_comment;
pub mod follow;
pub mod question;
pub mod question_comment;
pub mod role;
pub mod session;
pub mod topic;
pub mod topic_question;
pub mod user;

pub use answer::Entity as Answer;
pub use answer_comment::Entity as AnswerComment;
pub use follow::Entity as Follow;
pub use question::Entity as Question;
pub use question_comment::Entity as QuestionComment;
pub use role::Entity as Role;
pub use session::Entity as Session;
pub use topic::Entity as Topic;
pub use topic_question::Entity as TopicQuestion;
pub use user::Entity as User;

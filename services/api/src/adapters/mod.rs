pub mod course_store;
pub mod llm;

pub use course_store::InMemoryCourseStore;
pub use llm::OpenAiCompletionAdapter;

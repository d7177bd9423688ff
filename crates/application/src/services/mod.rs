mod chat_service;
mod user_service;

pub use chat_service::{ChatService, ChatServiceDependencies};
pub use user_service::{UserService, UserServiceDependencies};

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod user_service_tests;

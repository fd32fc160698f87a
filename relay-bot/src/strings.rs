//! User-facing message texts. Kept in one place so wording changes do not
//! touch handler logic.

pub const MSG_THINKING: &str = "Thinking...";

pub const MSG_WELCOME: &str =
    "Hello! Send me a message and I will relay it to a language model. Use /help for commands.";

pub const MSG_HELP: &str = "Available commands:\n\
/start - welcome message\n\
/help - this list\n\
/reset - clear your conversation history\n\
/model - choose a model\n\
/state - current bot state\n\
Any other text is sent to the model.";

pub const MSG_RESET_DONE: &str = "Conversation history cleared.";
pub const MSG_NO_ACCESS: &str = "You do not have access to this command.";
pub const MSG_MAINTENANCE: &str = "The bot is under maintenance, please try again later.";
pub const MSG_UNKNOWN_COMMAND: &str = "Unknown command. Use /help to see what I understand.";
pub const MSG_WRONG_ARGS: &str = "Wrong number of arguments for this action.";
pub const MSG_CANCELLED: &str = "Operation cancelled.";
pub const MSG_EMPTY_RESPONSE: &str = "The model returned an empty response.";
pub const MSG_CHOOSE_MODEL: &str = "Choose a model:";
pub const MSG_MODEL_UNAVAILABLE: &str = "That model is not available to you.";
pub const MSG_CHOOSE_LEVEL: &str = "Choose a new access level:";
pub const MSG_NO_USERS: &str = "No users yet.";
pub const MSG_NO_REQUESTS: &str = "This user has no requests yet.";
pub const MSG_BAD_USER_ID: &str = "That does not look like a user id.";

pub const BTN_CANCEL: &str = "Cancel";
pub const BTN_DELETE_USER: &str = "Delete user";
pub const BTN_CHANGE_LEVEL: &str = "Change access level";
pub const BTN_FORWARD_REQUESTS: &str = "Forward requests";

pub fn model_chosen(name: &str) -> String {
    format!("Model set to {}.", name)
}

pub fn state_message(model: &str, stability: f64) -> String {
    format!("Current model: {}\nStability: {:.1}%", model, stability)
}

pub fn answer_failed(stability: f64) -> String {
    format!(
        "Something went wrong while answering. Current stability: {:.1}%",
        stability
    )
}

pub fn user_not_found(id: i64) -> String {
    format!("User {} not found.", id)
}

pub fn user_deleted(id: i64) -> String {
    format!("User {} deleted.", id)
}

pub fn level_changed(id: i64, label: &str) -> String {
    format!("Access level of user {} is now {}.", id, label)
}

pub fn forwarded_requests(count: usize) -> String {
    format!("Forwarded {} request(s).", count)
}

pub fn user_card(id: i64, first_name: &str, level_label: &str, requests: usize) -> String {
    format!(
        "ID: {}\nName: {}\nAccess level: {}\nRequests: {}",
        id, first_name, level_label, requests
    )
}

use super::models::MessageSummary;

/// Fixed messages used instead of the live mailbox in demo mode
pub fn demo_messages() -> Vec<MessageSummary> {
    vec![
        MessageSummary::fixture(
            "Alice <alice@example.com>",
            "Standup notes",
            "We shipped auth; next sprint on analytics.",
        ),
        MessageSummary::fixture(
            "Recruiter <jobs@company.com>",
            "Interview Loop",
            "Wed/Thu for the technical screen?",
        ),
        MessageSummary::fixture(
            "Billing <billing@service.com>",
            "Invoice Due",
            "Invoice #123 is due on 31 Oct.",
        ),
    ]
}

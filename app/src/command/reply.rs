use chatdeck_core::ReplyBook;

/// Input parameters for the Reply command strategy.
#[derive(Debug, Clone)]
pub struct ReplyInput {
    pub text: String,
}

/// Strategy for answering one message from the canned reply book.
///
/// No config, credential or network is involved.
#[derive(Debug, Clone, Copy)]
pub struct ReplyStrategy;

impl super::CommandStrategy for ReplyStrategy {
    type Input = ReplyInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let text = input.text.trim();
        if text.is_empty() {
            anyhow::bail!("Message must not be empty");
        }

        println!("{}", ReplyBook::fortune().reply(text));
        Ok(())
    }
}

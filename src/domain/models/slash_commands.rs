#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .trim()
            .split(' ')
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }
        let prefix = args[0].to_string();
        args.remove(0);

        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_help()
            || cmd.is_cancel()
            || cmd.is_clear()
            || cmd.is_delete()
            || cmd.is_language()
            || cmd.is_persona()
            || cmd.is_history()
            || cmd.is_sign_in()
            || cmd.is_sign_out()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn first_arg(&self) -> Option<&str> {
        return self.args.first().map(|e| return e.as_str());
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    pub fn is_cancel(&self) -> bool {
        return ["/x", "/cancel"].contains(&self.command.as_str());
    }

    pub fn is_clear(&self) -> bool {
        return ["/c", "/clear"].contains(&self.command.as_str());
    }

    pub fn is_delete(&self) -> bool {
        return ["/d", "/delete"].contains(&self.command.as_str()) && !self.args.is_empty();
    }

    pub fn is_language(&self) -> bool {
        return ["/l", "/language", "/lang"].contains(&self.command.as_str());
    }

    pub fn is_persona(&self) -> bool {
        return ["/p", "/persona"].contains(&self.command.as_str());
    }

    pub fn is_history(&self) -> bool {
        return ["/hi", "/history"].contains(&self.command.as_str());
    }

    /// `/signin <email> <password>`
    pub fn is_sign_in(&self) -> bool {
        return ["/signin", "/login"].contains(&self.command.as_str()) && self.args.len() >= 2;
    }

    pub fn is_sign_out(&self) -> bool {
        return ["/signout", "/logout"].contains(&self.command.as_str());
    }
}

use iced::widget::{container, horizontal_space, row, text};
use iced::{Border, Color, Element, Theme};

use crate::conversation::Role;

pub const THOUGHTS_PREFIX: &str = "🧠 Thoughts:\n";

const USER_BACKGROUND: Color = iced::color!(0x00, 0x78, 0xd7);
const ASSISTANT_BACKGROUND: Color = iced::color!(0x2c, 0x2c, 0x2c);
const MAX_WIDTH: f32 = 400.0;

/// A rendered chat entry. Thoughts get their own bubble but never their own history message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bubble {
    pub role: Role,
    pub text: String,
}

impl Bubble {
    pub fn user(text: impl Into<String>) -> Self {
        Bubble {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Bubble {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn thoughts(thoughts: &str) -> Self {
        Self::assistant(format!("{}{}", THOUGHTS_PREFIX, thoughts))
    }

    pub fn view<'a, M: 'a>(&'a self) -> Element<'a, M> {
        let background = match self.role {
            Role::User => USER_BACKGROUND,
            Role::Assistant => ASSISTANT_BACKGROUND,
        };

        let label = container(text(self.text.as_str()).size(14))
            .padding(10)
            .max_width(MAX_WIDTH)
            .style(move |_theme: &Theme| container::Style {
                background: Some(background.into()),
                text_color: Some(Color::WHITE),
                border: Border {
                    radius: 12.0.into(),
                    ..Border::default()
                },
                ..container::Style::default()
            });

        let line = match self.role {
            Role::User => row![horizontal_space(), label],
            Role::Assistant => row![label, horizontal_space()],
        };

        line.padding([5, 10]).into()
    }
}

mod bubble;
mod client;
mod config;
mod conversation;
mod worker;

use iced::{
    widget::{button, column, container, horizontal_space, pick_list, row, scrollable, text, text_input},
    Element, Length, Task, Theme, Font, Subscription, Color, Border,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment, font,
    window,
};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use bubble::Bubble;
use client::{ChatClient, ChatRequest};
use conversation::{ChatMessage, Conversation};
use worker::{RequestWorker, WorkerEvent};

const THINKING_STATUS: &str = "🧠 Thinking...";

fn main() -> iced::Result {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::Config::load();
    log::info!("Chat endpoint: {}", config.chat.endpoint);

    let window_settings = window::Settings {
        size: iced::Size::new(config.window.width as f32, config.window.height as f32),
        position: window::Position::Centered,
        resizable: config.window.resizable,
        ..Default::default()
    };

    iced::application("DeepSeek Chat", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window_settings)
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone)]
enum Message {
    InputChanged(String),
    Submit,
    ModelSelected(String),
    Worker(u64, WorkerEvent),
    Stop,
}

/// The turn whose worker events the window still accepts.
struct PendingTurn {
    id: u64,
    cancel: CancellationToken,
}

struct App {
    client: ChatClient,
    models: Vec<String>,
    selected_model: String,
    progress_interval: Duration,
    conversation: Conversation,
    bubbles: Vec<Bubble>,
    input_text: String,
    status: String,
    pending: Option<PendingTurn>,
    next_turn: u64,
    input_id: text_input::Id,
    chat_id: scrollable::Id,
}

fn worker_events(
    events: UnboundedReceiver<WorkerEvent>,
) -> impl futures_util::Stream<Item = WorkerEvent> {
    futures_util::stream::unfold(events, |mut events| async move {
        events.recv().await.map(|event| (event, events))
    })
}

impl App {
    fn new(config: config::Config) -> (Self, Task<Message>) {
        let chat = config.chat;
        let selected_model = chat.models.first().cloned().unwrap_or_default();
        let input_id = text_input::Id::unique();

        let app = App {
            client: ChatClient::with_endpoint(chat.endpoint),
            selected_model,
            models: chat.models,
            progress_interval: Duration::from_millis(chat.progress_interval_ms),
            conversation: Conversation::with_greeting(chat.greeting.clone()),
            bubbles: vec![Bubble::assistant(chat.greeting)],
            input_text: String::new(),
            status: String::new(),
            pending: None,
            next_turn: 0,
            input_id: input_id.clone(),
            chat_id: scrollable::Id::new("conversation"),
        };

        (app, text_input::focus(input_id))
    }

    fn request_for_turn(&self) -> ChatRequest {
        ChatRequest::new(self.selected_model.clone(), self.conversation.snapshot())
    }

    fn scroll_to_bottom(&self) -> Task<Message> {
        scrollable::snap_to(self.chat_id.clone(), scrollable::RelativeOffset::END)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::InputChanged(value) => {
                self.input_text = value;
                Task::none()
            }
            Message::Submit => {
                let prompt = self.input_text.trim().to_string();
                if prompt.is_empty() {
                    return Task::none();
                }
                if self.pending.is_some() {
                    log::debug!("Ignoring submit while a turn is in flight");
                    return Task::none();
                }

                self.input_text.clear();
                self.bubbles.push(Bubble::user(prompt.clone()));
                self.conversation.push(ChatMessage::user(prompt));
                self.status = THINKING_STATUS.to_string();

                let request = self.request_for_turn();
                log::info!(
                    "Starting turn with model {} ({} messages)",
                    request.model,
                    request.messages.len()
                );

                let worker = RequestWorker::new(self.client.clone(), request, self.progress_interval);
                let turn = self.next_turn;
                self.next_turn += 1;
                self.pending = Some(PendingTurn {
                    id: turn,
                    cancel: worker.cancel_token(),
                });
                let events = worker.spawn();

                Task::batch([
                    Task::run(worker_events(events), move |event| Message::Worker(turn, event)),
                    self.scroll_to_bottom(),
                ])
            }
            Message::ModelSelected(model) => {
                log::info!("Model switched to {}", model);
                self.selected_model = model;
                Task::none()
            }
            Message::Worker(turn, event) => {
                if self.pending.as_ref().map(|pending| pending.id) != Some(turn) {
                    log::debug!("Dropping event from abandoned turn {}: {:?}", turn, event);
                    return Task::none();
                }
                self.apply_worker_event(event)
            }
            Message::Stop => {
                // The request itself may still be running; its late events are dropped by turn id.
                if let Some(pending) = self.pending.take() {
                    log::info!("Abandoning turn {}", pending.id);
                    pending.cancel.cancel();
                    self.status.clear();
                }
                Task::none()
            }
        }
    }

    fn apply_worker_event(&mut self, event: WorkerEvent) -> Task<Message> {
        match event {
            WorkerEvent::Progress(status) => {
                self.status = status;
                Task::none()
            }
            WorkerEvent::Finished(result) => {
                self.status.clear();
                self.pending = None;

                if !result.thoughts.is_empty() {
                    self.bubbles.push(Bubble::thoughts(&result.thoughts));
                }
                self.bubbles.push(Bubble::assistant(result.answer.clone()));
                self.conversation.push(ChatMessage::assistant(result.history_content()));
                log::debug!("Conversation now holds {} messages", self.conversation.len());

                self.scroll_to_bottom()
            }
            WorkerEvent::Cancelled => {
                self.status.clear();
                self.pending = None;
                Task::none()
            }
        }
    }

    fn subscription(&self) -> Subscription<Message> {
        event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Stop)
            } else {
                None
            }
        })
    }

    fn view(&self) -> Element<Message> {
        let title = text("🤖 DeepSeek Chat").size(18).font(Font {
            weight: font::Weight::Bold,
            ..Font::DEFAULT
        });
        let subtitle = text("Reasoning before replying")
            .size(13)
            .color(Color::from_rgb8(0xaa, 0xaa, 0xaa));

        let model_selector = pick_list(
            self.models.as_slice(),
            Some(&self.selected_model),
            Message::ModelSelected,
        )
        .padding(6);

        let header = row![column![title, subtitle].spacing(2), horizontal_space(), model_selector]
            .align_y(alignment::Vertical::Center);

        let chat_list = scrollable(column(self.bubbles.iter().map(|bubble| bubble.view())).width(Length::Fill))
            .id(self.chat_id.clone())
            .height(Length::Fill);

        let status = container(
            text(self.status.as_str())
                .size(13)
                .color(Color::from_rgb8(0x88, 0x88, 0x88))
                .font(Font {
                    style: font::Style::Italic,
                    ..Font::DEFAULT
                }),
        )
        .width(Length::Fill)
        .align_x(alignment::Horizontal::Center);

        let input = text_input("Type your message...", &self.input_text)
            .on_input(Message::InputChanged)
            .on_submit(Message::Submit)
            .padding(10)
            .size(15)
            .id(self.input_id.clone());

        let action = if self.pending.is_some() {
            button(text("Stop")).on_press(Message::Stop).padding(10)
        } else {
            button(text("Send"))
                .on_press(Message::Submit)
                .padding(10)
                .style(|_theme: &Theme, _status| button::Style {
                    background: Some(Color::from_rgb8(0x00, 0xe6, 0xcb).into()),
                    text_color: Color::BLACK,
                    border: Border {
                        radius: 8.0.into(),
                        ..Border::default()
                    },
                    ..button::Style::default()
                })
        };

        let input_row = row![input, action]
            .spacing(8)
            .align_y(alignment::Vertical::Center);

        container(
            column![header, chat_list, status, input_row]
                .spacing(10)
                .padding(10),
        )
        .width(Length::Fill)
        .height(Length::Fill)
        .style(|_theme: &Theme| container::Style {
            background: Some(Color::from_rgb8(0x12, 0x12, 0x12).into()),
            text_color: Some(Color::WHITE),
            ..container::Style::default()
        })
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

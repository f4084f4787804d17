use crate::config::{self, Config};
use crate::events::AppEvent;
use crate::gui::deck::model::DeckKey;
use crate::gui::deck::{self, DeckState};
use crate::gui::theme::{self, ThemeColors};
use crate::gui::window;
use gtk::prelude::*;
use gtk4 as gtk;
use relm4::prelude::*;
use stage::content;
use stage::gate::{GateOutcome, SHAKE_DURATION, View};
use stage::geometry::{Point, Size};
use stage::remote::RemoteCommand;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

/// The single pending deadline wake-up. The slot is emptied by the timeout
/// itself when it fires, so only live sources are ever removed.
#[derive(Default)]
struct Wakeup {
    source: Rc<RefCell<Option<glib::SourceId>>>,
}

impl Wakeup {
    fn arm(&self, delay: Duration, sender: ComponentSender<AppModel>) {
        self.cancel();
        let slot = self.source.clone();
        let id = glib::timeout_add_local_once(delay, move || {
            slot.borrow_mut().take();
            sender.input(AppMsg::Wakeup);
        });
        *self.source.borrow_mut() = Some(id);
    }

    fn cancel(&self) {
        if let Some(id) = self.source.borrow_mut().take() {
            id.remove();
        }
    }
}

pub struct AppModel {
    pub state: Rc<RefCell<DeckState>>,
    pub config: Config,
    pub view: View,
    pub submit_enabled: bool,
    pub login_error: bool,
    pub root: gtk::ApplicationWindow,
    pub drawing_area: gtk::DrawingArea,
    pub password: gtk::PasswordEntry,
    wakeup: Wakeup,
    frames: Option<gtk::TickCallbackId>,
}

#[derive(Debug)]
pub enum AppMsg {
    Submit,
    Wakeup,
    Key(DeckKey),
    PointerMove(Point),
    PointerLeave,
    Click(Point),
    Scroll(f64),
    TouchBegin(f64),
    TouchEnd(f64),
    Resize(Size),
    Mapped,
    Unmapped,
    Remote(RemoteCommand),
    ConfigReload,
}

impl From<AppEvent> for AppMsg {
    fn from(event: AppEvent) -> Self {
        match event {
            AppEvent::Remote(cmd) => AppMsg::Remote(cmd),
            AppEvent::ConfigReload => AppMsg::ConfigReload,
        }
    }
}

#[relm4::component(pub)]
impl SimpleComponent for AppModel {
    type Init = (DeckState, Config, async_channel::Receiver<AppEvent>);
    type Input = AppMsg;
    type Output = ();

    view! {
        #[root]
        gtk::ApplicationWindow {
            set_title: Some("Podium"),
            add_css_class: "podium-window",

            add_controller = gtk::EventControllerKey {
                connect_key_pressed[sender] => move |_, key, _, _| {
                    match window::deck_key(key) {
                        Some(key) => {
                            sender.input(AppMsg::Key(key));
                            glib::Propagation::Stop
                        }
                        None => glib::Propagation::Proceed,
                    }
                }
            },

            gtk::Box {
                set_orientation: gtk::Orientation::Vertical,

                #[name = "drawing_area"]
                gtk::DrawingArea {
                    set_hexpand: true,
                    set_vexpand: true,
                    set_focusable: true,
                    add_css_class: "podium-deck",
                    #[watch]
                    set_visible: model.view == View::Content,

                    connect_map[sender] => move |_| {
                        sender.input(AppMsg::Mapped);
                    },
                    connect_unmap[sender] => move |_| {
                        sender.input(AppMsg::Unmapped);
                    },
                    connect_resize[sender] => move |_, w, h| {
                        sender.input(AppMsg::Resize(Size::new(w as f64, h as f64)));
                    },

                    add_controller = gtk::EventControllerMotion {
                        connect_motion[sender] => move |_, x, y| {
                            sender.input(AppMsg::PointerMove(Point::new(x, y)));
                        },
                        connect_leave[sender] => move |_| {
                            sender.input(AppMsg::PointerLeave);
                        }
                    },

                    add_controller = gtk::GestureClick {
                        set_button: 1, // primary only
                        connect_released[sender] => move |_, _, x, y| {
                            sender.input(AppMsg::Click(Point::new(x, y)));
                        }
                    }
                },

                gtk::Box {
                    set_orientation: gtk::Orientation::Vertical,
                    set_hexpand: true,
                    set_vexpand: true,
                    set_halign: gtk::Align::Center,
                    set_valign: gtk::Align::Center,
                    #[watch]
                    set_visible: model.view == View::Login,

                    gtk::Box {
                        set_orientation: gtk::Orientation::Vertical,
                        set_spacing: 16,
                        add_css_class: "podium-login",

                        gtk::Label {
                            set_label: "Podium",
                            add_css_class: "podium-login-title",
                        },
                        gtk::Label {
                            set_label: "Enter the passphrase to continue",
                        },

                        #[name = "password"]
                        gtk::PasswordEntry {
                            set_show_peek_icon: true,
                            set_width_request: 280,
                            connect_activate[sender] => move |_| {
                                sender.input(AppMsg::Submit);
                            },
                        },

                        gtk::Button {
                            set_label: "Enter",
                            #[watch]
                            set_sensitive: model.submit_enabled,
                            connect_clicked[sender] => move |_| {
                                sender.input(AppMsg::Submit);
                            },
                        },

                        gtk::Label {
                            set_label: "Incorrect passphrase",
                            add_css_class: "podium-error",
                            #[watch]
                            set_visible: model.login_error,
                        },
                    },
                },
            }
        }
    }

    fn init(
        init: Self::Init,
        root: Self::Root,
        sender: ComponentSender<Self>,
    ) -> ComponentParts<Self> {
        let (state, config, rx) = init;

        theme::load_css();
        window::apply_window_config(&root, &config.window);

        let view = state.view;
        let state = Rc::new(RefCell::new(state));

        let model = AppModel {
            state: state.clone(),
            config,
            view,
            submit_enabled: true,
            login_error: false,
            root: root.clone(),
            drawing_area: gtk::DrawingArea::default(),
            password: gtk::PasswordEntry::new(),
            wakeup: Wakeup::default(),
            frames: None,
        };

        let widgets = view_output!();

        let mut model = model;
        model.drawing_area = widgets.drawing_area.clone();
        model.password = widgets.password.clone();

        let state_draw = model.state.clone();
        widgets
            .drawing_area
            .set_draw_func(move |drawing_area, cr, _, _| {
                let style_context = drawing_area.style_context();
                let colors = ThemeColors::from_context(&style_context);
                let mut state = state_draw.borrow_mut();
                let now = state.now();
                if let Err(e) = deck::draw(cr, &mut state, &colors, now) {
                    log::error!("Drawing error: {}", e);
                }
            });

        let scroll = gtk::EventControllerScroll::new(gtk::EventControllerScrollFlags::VERTICAL);
        {
            let sender = sender.clone();
            scroll.connect_scroll(move |_, _, dy| {
                sender.input(AppMsg::Scroll(dy));
                glib::Propagation::Stop
            });
        }
        widgets.drawing_area.add_controller(scroll);

        let swipe = gtk::GestureDrag::new();
        swipe.set_touch_only(true);
        {
            let sender = sender.clone();
            swipe.connect_drag_begin(move |_, _, y| {
                sender.input(AppMsg::TouchBegin(y));
            });
        }
        {
            let sender = sender.clone();
            swipe.connect_drag_end(move |gesture, _, dy| {
                if let Some((_, y)) = gesture.start_point() {
                    sender.input(AppMsg::TouchEnd(y + dy));
                }
            });
        }
        widgets.drawing_area.add_controller(swipe);

        window::set_cursor_hidden(&widgets.drawing_area, model.config.window.hide_cursor);

        let sender_clone = sender.clone();
        relm4::spawn(async move {
            while let Ok(event) = rx.recv().await {
                sender_clone.input(AppMsg::from(event));
            }
        });

        if view == View::Login {
            widgets.password.grab_focus();
        }
        ComponentParts { model, widgets }
    }

    fn update(&mut self, msg: Self::Input, sender: ComponentSender<Self>) {
        let now = self.state.borrow().now();

        match msg {
            AppMsg::Submit => {
                let input = self.password.text();
                if let Err(e) = self.state.borrow_mut().submit_password(&input, now) {
                    log::debug!("Submit ignored: {}", e);
                }
            }
            AppMsg::Wakeup => {
                let outcome = self.state.borrow_mut().fire(now);
                match outcome {
                    Some(GateOutcome::Denied) => self.reject_password(),
                    Some(GateOutcome::Granted(_)) => {
                        self.password.set_text("");
                        self.drawing_area.grab_focus();
                    }
                    None => {}
                }
            }
            AppMsg::Key(key) => self.state.borrow_mut().key(key, now),
            AppMsg::PointerMove(p) => self.state.borrow_mut().pointer_moved(p, now),
            AppMsg::PointerLeave => self.state.borrow_mut().pointer_left(),
            AppMsg::Click(p) => self.state.borrow_mut().click(p, now),
            AppMsg::Scroll(dy) => self.state.borrow_mut().scroll(dy, now),
            AppMsg::TouchBegin(y) => self.state.borrow_mut().touch_begin(y),
            AppMsg::TouchEnd(y) => self.state.borrow_mut().touch_end(y, now),
            AppMsg::Resize(size) => self.state.borrow_mut().resize(size),
            AppMsg::Mapped => {
                let mut state = self.state.borrow_mut();
                state.resize(window::widget_size(&self.drawing_area));
                state.particles.start();
                drop(state);
                self.start_frames();
            }
            AppMsg::Unmapped => {
                self.state.borrow_mut().particles.stop();
                self.stop_frames();
            }
            AppMsg::Remote(cmd) => {
                log::debug!("Remote command '{}'", cmd);
                self.state.borrow_mut().remote(cmd, now);
            }
            AppMsg::ConfigReload => match config::load_config() {
                Ok(new_config) => {
                    let deck = content::load_or_default(new_config.content.as_deref());
                    self.state.borrow_mut().reload(&new_config, Some(deck));
                    window::apply_window_config(&self.root, &new_config.window);
                    window::set_cursor_hidden(&self.drawing_area, new_config.window.hide_cursor);
                    self.config = new_config;
                    log::info!("Configuration reloaded");
                }
                Err(e) => log::error!("Failed to reload config: {}", e),
            },
        }

        self.sync(sender);
    }

    fn shutdown(&mut self, _widgets: &mut Self::Widgets, _output: relm4::Sender<Self::Output>) {
        self.wakeup.cancel();
        self.stop_frames();
    }
}

impl AppModel {
    /// Mirrors gate state into the widgets and re-arms the wake-up for the
    /// earliest pending deadline.
    fn sync(&mut self, sender: ComponentSender<Self>) {
        let state = self.state.borrow();
        self.view = state.view;
        self.submit_enabled = state.gate.submit_enabled();
        self.login_error = state.gate.error_visible();

        match state.next_wakeup() {
            Some(due) => self.wakeup.arm(due.saturating_sub(state.now()), sender),
            None => self.wakeup.cancel(),
        }
        drop(state);

        if self.view == View::Content {
            self.drawing_area.queue_draw();
        }
    }

    fn reject_password(&self) {
        self.password.set_text("");
        self.password.grab_focus();
        self.password.add_css_class("shake");
        let password = self.password.clone();
        glib::timeout_add_local_once(SHAKE_DURATION, move || {
            password.remove_css_class("shake");
        });
    }

    fn start_frames(&mut self) {
        if self.frames.is_some() {
            return;
        }
        let state = self.state.clone();
        let id = self.drawing_area.add_tick_callback(move |area, _| {
            {
                let mut state = state.borrow_mut();
                let now = state.now();
                state.frame(now);
            }
            area.queue_draw();
            glib::ControlFlow::Continue
        });
        self.frames = Some(id);
    }

    fn stop_frames(&mut self) {
        if let Some(id) = self.frames.take() {
            id.remove();
        }
    }
}

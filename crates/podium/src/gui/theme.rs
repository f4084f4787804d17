use gtk::gdk;
use gtk::prelude::*;
use gtk4 as gtk;
use palette::Srgba;
use stage::particles::Tint;

pub struct ThemeColors {
    pub gold: Srgba<f64>,
    pub navy: Srgba<f64>,
    pub background: Srgba<f64>,
    pub text: Srgba<f64>,
    pub muted: Srgba<f64>,
    pub card: Srgba<f64>,
    pub overlay: Srgba<f64>,
}

impl ThemeColors {
    pub fn from_context(context: &gtk::StyleContext) -> Self {
        Self {
            gold: Self::lookup_color(context, "podium_gold", tint(Tint::Gold), None),
            navy: Self::lookup_color(context, "podium_navy", tint(Tint::Navy), None),
            background: Self::lookup_color(
                context,
                "podium_bg",
                Srgba::new(0.02, 0.06, 0.13, 1.0),
                Some(1.0),
            ),
            text: Self::lookup_color(
                context,
                "podium_fg",
                Srgba::new(0.96, 0.95, 0.92, 1.0),
                None,
            ),
            muted: Self::lookup_color(
                context,
                "podium_fg",
                Srgba::new(0.96, 0.95, 0.92, 0.65),
                Some(0.65),
            ),
            card: Self::lookup_color(
                context,
                "podium_card",
                Srgba::new(1.0, 1.0, 1.0, 0.06),
                Some(0.06),
            ),
            overlay: Self::lookup_color(
                context,
                "podium_bg",
                Srgba::new(0.02, 0.06, 0.13, 0.85),
                Some(0.85),
            ),
        }
    }

    fn lookup_color(
        context: &gtk::StyleContext,
        name: &str,
        fallback: Srgba<f64>,
        alpha_override: Option<f64>,
    ) -> Srgba<f64> {
        context
            .lookup_color(name)
            .map(|c| {
                let (r, g, b, a) = (
                    c.red() as f64,
                    c.green() as f64,
                    c.blue() as f64,
                    c.alpha() as f64,
                );
                Srgba::new(r, g, b, alpha_override.unwrap_or(a))
            })
            .unwrap_or(fallback)
    }

    pub fn tint(&self, tint: Tint) -> Srgba<f64> {
        match tint {
            Tint::Gold => self.gold,
            Tint::Navy => self.navy,
        }
    }
}

pub fn tint(tint: Tint) -> Srgba<f64> {
    let (r, g, b) = tint.rgb();
    Srgba::new(r, g, b, 255).into_format()
}

pub fn load_css() {
    let provider = gtk::CssProvider::new();
    let css_data = "
@define-color podium_gold #d39e46;
@define-color podium_navy #003363;
@define-color podium_bg #050f21;
@define-color podium_fg #f5f2eb;
@define-color podium_card rgba(255, 255, 255, 0.06);

.podium-window, .podium-deck {
    background-color: @podium_bg;
    color: @podium_fg;
}

.podium-login {
    padding: 48px;
    border-radius: 16px;
    border: 1px solid alpha(@podium_gold, 0.3);
    background-color: alpha(@podium_navy, 0.6);
}

.podium-login-title {
    font-size: 28px;
    font-weight: bold;
    color: @podium_gold;
}

.podium-login button {
    background: @podium_gold;
    color: @podium_bg;
    font-weight: bold;
}

.podium-error {
    color: #e06c5a;
}

@keyframes podium-shake {
    0%, 100% { margin-left: 0; margin-right: 0; }
    20%, 60% { margin-left: 0; margin-right: 12px; }
    40%, 80% { margin-left: 12px; margin-right: 0; }
}

.shake {
    animation: podium-shake 500ms ease-in-out;
}
";
    provider.load_from_data(css_data);

    if let Some(display) = gdk::Display::default() {
        gtk::style_context_add_provider_for_display(
            &display,
            &provider,
            gtk::STYLE_PROVIDER_PRIORITY_APPLICATION,
        );
    }
}

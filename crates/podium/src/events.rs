use stage::remote::RemoteCommand;

#[derive(Debug, Clone)]
pub enum AppEvent {
    Remote(RemoteCommand),
    ConfigReload,
}

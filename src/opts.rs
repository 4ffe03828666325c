//! Server options.

/// Options for a wiretable server.
#[derive(Debug, Clone)]
pub struct ServerOpts {
    /// Hostname or IP address to listen on.
    ///
    /// Default: `"127.0.0.1"`
    pub host: String,

    /// Port number to listen on. `0` binds an ephemeral port.
    ///
    /// Default: `5432`
    pub port: u16,

    /// Value reported for the `server_version` startup parameter.
    ///
    /// Default: `"9.2"`
    pub server_version: String,

    /// Value reported for the `DateStyle` startup parameter.
    ///
    /// Default: `"ISO YMB"`
    pub date_style: String,
}

impl Default for ServerOpts {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5432,
            server_version: "9.2".into(),
            date_style: "ISO YMB".into(),
        }
    }
}

impl ServerOpts {
    /// The startup parameters echoed to every client after authentication,
    /// in emission order.
    pub fn startup_parameters(&self) -> [(&'static str, &str); 4] {
        [
            ("server_version", self.server_version.as_str()),
            ("server_encoding", "UTF8"),
            ("client_encoding", "UTF8"),
            ("DateStyle", self.date_style.as_str()),
        ]
    }
}

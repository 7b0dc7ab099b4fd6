#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    QUIT,
    NOOP,
    FEAT,
    TYPE,
    AUTH,
    PBSZ,
    PROT,
    PWD,
    CWD,
    CDUP,
    MKD,
    RMD,
    DELE,
    RNFR,
    RNTO,
    SIZE,
    LIST,
    NLST,
    RETR,
    STOR,
    PORT,
    EPRT,
    PASV,
    EPSV,
}

impl FtpCommand {
    pub fn from_str(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "QUIT" => Some(FtpCommand::QUIT),
            "NOOP" => Some(FtpCommand::NOOP),
            "FEAT" => Some(FtpCommand::FEAT),
            "TYPE" => Some(FtpCommand::TYPE),
            "AUTH" => Some(FtpCommand::AUTH),
            "PBSZ" => Some(FtpCommand::PBSZ),
            "PROT" => Some(FtpCommand::PROT),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "CDUP" => Some(FtpCommand::CDUP),
            "MKD" => Some(FtpCommand::MKD),
            "RMD" => Some(FtpCommand::RMD),
            "DELE" => Some(FtpCommand::DELE),
            "RNFR" => Some(FtpCommand::RNFR),
            "RNTO" => Some(FtpCommand::RNTO),
            "SIZE" => Some(FtpCommand::SIZE),
            "LIST" => Some(FtpCommand::LIST),
            "NLST" => Some(FtpCommand::NLST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "PORT" => Some(FtpCommand::PORT),
            "EPRT" => Some(FtpCommand::EPRT),
            "PASV" => Some(FtpCommand::PASV),
            "EPSV" => Some(FtpCommand::EPSV),
            _ => None,
        }
    }

    /// Commands accepted before login and on an insecure TLS-only connection.
    pub fn is_auth_exempt(&self) -> bool {
        matches!(
            self,
            FtpCommand::AUTH
                | FtpCommand::FEAT
                | FtpCommand::NOOP
                | FtpCommand::PASS
                | FtpCommand::PBSZ
                | FtpCommand::PROT
                | FtpCommand::QUIT
                | FtpCommand::TYPE
                | FtpCommand::USER
        )
    }

    /// Commands that move bytes over the data channel.
    pub fn requires_data_channel(&self) -> bool {
        matches!(
            self,
            FtpCommand::LIST | FtpCommand::NLST | FtpCommand::RETR | FtpCommand::STOR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!(FtpCommand::from_str("user"), Some(FtpCommand::USER));
        assert_eq!(FtpCommand::from_str("EpSv"), Some(FtpCommand::EPSV));
        assert_eq!(FtpCommand::from_str("SITE"), None);
        assert_eq!(FtpCommand::from_str(""), None);
    }

    #[test]
    fn test_gating_sets() {
        assert!(FtpCommand::USER.is_auth_exempt());
        assert!(FtpCommand::PBSZ.is_auth_exempt());
        assert!(!FtpCommand::PWD.is_auth_exempt());
        assert!(!FtpCommand::PASV.is_auth_exempt());

        assert!(FtpCommand::NLST.requires_data_channel());
        assert!(FtpCommand::STOR.requires_data_channel());
        assert!(!FtpCommand::SIZE.requires_data_channel());
    }
}

//! Email bodies for the account flows. Plain HTML strings, rendered inline.

pub fn verify_email_template(name: &str, otp: &str, url: &str) -> String {
    format!(
        "<div>\
           <p>Hi {name},</p>\
           <p>Thank you for registering. Use the code below to verify your email:</p>\
           <h2>{otp}</h2>\
           <p>Or open <a href=\"{url}\">{url}</a>.</p>\
           <p>The code expires in 5 minutes.</p>\
         </div>"
    )
}

pub fn forgot_password_template(name: &str, otp: &str) -> String {
    format!(
        "<div>\
           <p>Hi {name},</p>\
           <p>Use this one-time code to reset your password:</p>\
           <h2>{otp}</h2>\
           <p>The code expires in 1 hour. Ignore this email if you did not request a reset.</p>\
         </div>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_template_contains_code_and_link() {
        let html = verify_email_template("Ada", "123456", "https://shop.local/verify");
        assert!(html.contains("Ada"));
        assert!(html.contains("123456"));
        assert!(html.contains("https://shop.local/verify"));
    }

    #[test]
    fn forgot_template_contains_code() {
        let html = forgot_password_template("Ada", "654321");
        assert!(html.contains("654321"));
    }
}

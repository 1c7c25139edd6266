use pos_common::calculate_hmac;

use crate::data_objects::PaymentOrderForm;

/// The string the provider expects the request MAC to be computed over.
pub fn request_mac_input(form: &PaymentOrderForm) -> String {
    format!(
        "{}|{}|{}|{}|{}|{}|{}",
        form.app_id, form.app_trans_id, form.app_user, form.amount, form.app_time, form.embed_data, form.item
    )
}

/// Computes and stores the request MAC on the form using `key1`.
pub fn sign_form(form: &mut PaymentOrderForm, key1: &str) {
    let input = request_mac_input(form);
    form.mac = calculate_hmac(key1, input.as_bytes());
}

#[cfg(test)]
mod test {
    use super::*;

    fn form() -> PaymentOrderForm {
        PaymentOrderForm {
            app_id: "2554".into(),
            app_trans_id: "240612_42_1".into(),
            app_user: "pos_terminal".into(),
            app_time: 1_718_150_400_000,
            item: "[]".into(),
            embed_data: "{}".into(),
            amount: 50_000,
            description: "Order #42".into(),
            bank_code: String::new(),
            callback_url: "https://pos.example.com/zalopay/callback".into(),
            mac: String::new(),
        }
    }

    #[test]
    fn mac_input_order() {
        assert_eq!(request_mac_input(&form()), "2554|240612_42_1|pos_terminal|50000|1718150400000|{}|[]");
    }

    #[test]
    fn signing_covers_amount() {
        let mut a = form();
        sign_form(&mut a, "key1");
        assert_eq!(a.mac.len(), 64);
        let mut b = form();
        b.amount = 50_001;
        sign_form(&mut b, "key1");
        assert_ne!(a.mac, b.mac);
        // description is not part of the MAC
        let mut c = form();
        c.description = "changed".into();
        sign_form(&mut c, "key1");
        assert_eq!(a.mac, c.mac);
    }
}
